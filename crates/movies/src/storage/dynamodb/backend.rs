//! DynamoDB backend implementation.
//!
//! Implements `TableBackend` from `movies_core::storage` using DynamoDB.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use rust_decimal::Decimal;

use movies_core::movie::{Movie, MovieKey, MovieSummary, UpdatedInfo, YearRange};
use movies_core::storage::{
    Page, Result, StoreError, TableBackend, TableDescription, TableSchema,
};

use super::batch::BatchWriter;
use super::client::create_client;
use super::conversions::{
    attributes_to_updated_info, decimal_value, item_to_key, item_to_movie, item_to_summary,
    movie_to_item,
};
use super::error::map_sdk_error;
use super::keys::{
    self, QUERY_BY_YEAR_EXPRESSION, SCAN_PROJECTION, SCAN_YEAR_RANGE_FILTER,
    UPDATE_INFO_EXPRESSION, YEAR, YEAR_PLACEHOLDER,
};
use super::table;
use crate::config::{Config, TableWaitPolicy};

/// DynamoDB-based table backend.
#[derive(Debug, Clone)]
pub struct DynamoDbBackend {
    client: Client,
    wait: TableWaitPolicy,
}

impl DynamoDbBackend {
    /// Creates a new backend with the given DynamoDB client.
    pub fn new(client: Client, wait: TableWaitPolicy) -> Self {
        Self { client, wait }
    }

    /// Creates a new backend from configuration.
    ///
    /// Uses the AWS SDK default credential chain; region and endpoint are
    /// overridden only when the configuration sets them.
    pub async fn from_config(config: &Config) -> Self {
        let client = create_client(config).await;
        Self::new(client, config.table_wait.clone())
    }
}

#[async_trait]
impl TableBackend for DynamoDbBackend {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        table::describe_table(&self.client, table_name).await
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<TableDescription> {
        table::create_table(&self.client, schema).await?;
        table::wait_for_table_active(&self.client, &schema.table_name, &self.wait).await
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        table::delete_table(&self.client, table_name).await?;
        table::wait_for_table_deleted(&self.client, table_name, &self.wait).await
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        table::list_tables(&self.client).await
    }

    async fn put_movie(&self, table_name: &str, movie: &Movie) -> Result<()> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(movie_to_item(movie)))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn get_movie(&self, table_name: &str, key: &MovieKey) -> Result<Option<Movie>> {
        let result = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(keys::key_attributes(key)))
            .send()
            .await
            .map_err(map_sdk_error)?;

        match result.item {
            Some(item) => Ok(Some(item_to_movie(&item)?)),
            None => Ok(None),
        }
    }

    async fn update_movie_info(
        &self,
        table_name: &str,
        key: &MovieKey,
        rating: Decimal,
        plot: &str,
    ) -> Result<UpdatedInfo> {
        let result = self
            .client
            .update_item()
            .table_name(table_name)
            .set_key(Some(keys::key_attributes(key)))
            .update_expression(UPDATE_INFO_EXPRESSION)
            .expression_attribute_values(":r", decimal_value(rating))
            .expression_attribute_values(":p", AttributeValue::S(plot.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let attributes = result.attributes.ok_or_else(|| {
            StoreError::InvalidData(format!("UpdateItem returned no attributes for {}", key))
        })?;
        attributes_to_updated_info(&attributes)
    }

    async fn delete_movie(&self, table_name: &str, key: &MovieKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(keys::key_attributes(key)))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn write_batch(&self, table_name: &str, movies: &[Movie]) -> Result<()> {
        let written = BatchWriter::new(self.client.clone(), table_name)
            .put_all(movies)
            .await?;
        tracing::debug!(table = %table_name, written, "Batch write complete");
        Ok(())
    }

    async fn query_page(
        &self,
        table_name: &str,
        year: i32,
        exclusive_start_key: Option<MovieKey>,
    ) -> Result<Page<Movie>> {
        let result = self
            .client
            .query()
            .table_name(table_name)
            .key_condition_expression(QUERY_BY_YEAR_EXPRESSION)
            .expression_attribute_names(YEAR_PLACEHOLDER, YEAR)
            .expression_attribute_values(":year", keys::year_value(year))
            .set_exclusive_start_key(exclusive_start_key.as_ref().map(keys::key_attributes))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(item_to_movie)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            last_evaluated_key: continuation(result.last_evaluated_key)?,
        })
    }

    async fn scan_page(
        &self,
        table_name: &str,
        range: YearRange,
        exclusive_start_key: Option<MovieKey>,
    ) -> Result<Page<MovieSummary>> {
        let result = self
            .client
            .scan()
            .table_name(table_name)
            .filter_expression(SCAN_YEAR_RANGE_FILTER)
            .projection_expression(SCAN_PROJECTION)
            .expression_attribute_names(YEAR_PLACEHOLDER, YEAR)
            .expression_attribute_values(":start_yr", keys::year_value(range.start()))
            .expression_attribute_values(":end_yr", keys::year_value(range.end()))
            .set_exclusive_start_key(exclusive_start_key.as_ref().map(keys::key_attributes))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(item_to_summary)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            last_evaluated_key: continuation(result.last_evaluated_key)?,
        })
    }
}

/// Decode a `LastEvaluatedKey`; an empty map means the read is exhausted.
fn continuation(
    last_evaluated_key: Option<HashMap<String, AttributeValue>>,
) -> Result<Option<MovieKey>> {
    match last_evaluated_key {
        Some(key) if !key.is_empty() => Ok(Some(item_to_key(&key)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use aws_sdk_dynamodb::operation::create_table::CreateTableOutput;
    use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
    use aws_sdk_dynamodb::operation::scan::ScanOutput;
    use aws_sdk_dynamodb::types::{BillingMode, TableStatus as ServiceTableStatus};
    use aws_smithy_mocks::mock;
    use movies_core::storage::{movies_table_schema, TableStatus};

    use crate::storage::dynamodb::mock as dynamo;

    fn matrix() -> Movie {
        Movie::new(1999, "The Matrix", "Red pill", Decimal::from_str("8.7").unwrap())
    }

    fn backend(rules: &[&aws_smithy_mocks::Rule]) -> DynamoDbBackend {
        DynamoDbBackend::new(dynamo::client(rules), dynamo::no_wait(3))
    }

    fn queries_year(req: &QueryInput, year: &str) -> bool {
        req.table_name() == Some("movies")
            && req.key_condition_expression() == Some(QUERY_BY_YEAR_EXPRESSION)
            && req
                .expression_attribute_names()
                .and_then(|names| names.get(YEAR_PLACEHOLDER))
                .map(String::as_str)
                == Some(YEAR)
            && req
                .expression_attribute_values()
                .and_then(|values| values.get(":year"))
                == Some(&AttributeValue::N(year.to_string()))
    }

    #[test]
    fn test_continuation_absent() {
        assert_eq!(continuation(None).unwrap(), None);
    }

    #[test]
    fn test_continuation_empty_map() {
        assert_eq!(continuation(Some(HashMap::new())).unwrap(), None);
    }

    #[test]
    fn test_continuation_decodes_key() {
        let key = MovieKey::new(1999, "The Matrix");

        let decoded = continuation(Some(keys::key_attributes(&key))).unwrap();

        assert_eq!(decoded, Some(key));
    }

    #[tokio::test]
    async fn test_create_table_sends_schema_and_waits() {
        let create = mock!(Client::create_table)
            .match_requests(|req| {
                req.table_name() == Some("movies")
                    && req.billing_mode() == Some(&BillingMode::Provisioned)
                    && req
                        .provisioned_throughput()
                        .map(|t| (t.read_capacity_units(), t.write_capacity_units()))
                        == Some((1, 1))
            })
            .then_output(|| CreateTableOutput::builder().build());
        let describe = mock!(Client::describe_table)
            .then_output(|| dynamo::described("movies", ServiceTableStatus::Active));
        let backend = backend(&[&create, &describe]);

        let description = backend
            .create_table(&movies_table_schema("movies"))
            .await
            .unwrap();

        assert_eq!(description.status, TableStatus::Active);
        assert_eq!(create.num_calls(), 1);
        assert_eq!(describe.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_query_page_request_and_token() {
        let rule = mock!(Client::query)
            .match_requests(|req| queries_year(req, "1999") && req.exclusive_start_key().is_none())
            .then_output(|| {
                QueryOutput::builder()
                    .items(movie_to_item(&matrix()))
                    .set_last_evaluated_key(Some(keys::key_attributes(&matrix().key())))
                    .build()
            });
        let backend = backend(&[&rule]);

        let page = backend.query_page("movies", 1999, None).await.unwrap();

        assert_eq!(page.items, vec![matrix()]);
        assert_eq!(page.last_evaluated_key, Some(matrix().key()));
    }

    #[tokio::test]
    async fn test_query_page_sends_exclusive_start_key() {
        let start = MovieKey::new(1999, "Fight Club");
        let expected = keys::key_attributes(&start);
        let rule = mock!(Client::query)
            .match_requests(move |req| {
                queries_year(req, "1999") && req.exclusive_start_key() == Some(&expected)
            })
            .then_output(|| QueryOutput::builder().build());
        let backend = backend(&[&rule]);

        let page = backend
            .query_page("movies", 1999, Some(start))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_scan_page_filters_and_projects() {
        let rule = mock!(Client::scan)
            .match_requests(|req| {
                let values = req.expression_attribute_values();
                req.table_name() == Some("movies")
                    && req.filter_expression() == Some(SCAN_YEAR_RANGE_FILTER)
                    && req.projection_expression() == Some(SCAN_PROJECTION)
                    && req
                        .expression_attribute_names()
                        .and_then(|names| names.get(YEAR_PLACEHOLDER))
                        .map(String::as_str)
                        == Some(YEAR)
                    && values.and_then(|v| v.get(":start_yr"))
                        == Some(&AttributeValue::N("1950".to_string()))
                    && values.and_then(|v| v.get(":end_yr"))
                        == Some(&AttributeValue::N("2015".to_string()))
            })
            .then_output(|| {
                let projected = HashMap::from([
                    (YEAR.to_string(), AttributeValue::N("1999".to_string())),
                    (
                        "title".to_string(),
                        AttributeValue::S("The Matrix".to_string()),
                    ),
                    (
                        "info".to_string(),
                        AttributeValue::M(HashMap::from([(
                            "rating".to_string(),
                            AttributeValue::N("8.7".to_string()),
                        )])),
                    ),
                ]);
                ScanOutput::builder()
                    .items(projected)
                    .set_last_evaluated_key(Some(keys::key_attributes(&matrix().key())))
                    .build()
            });
        let backend = backend(&[&rule]);
        let range = YearRange::new(1950, 2015).unwrap();

        let page = backend.scan_page("movies", range, None).await.unwrap();

        assert_eq!(page.items, vec![matrix().summary()]);
        assert!(page.has_more());
    }
}
