//! Table lifecycle operations (Imperative Shell).

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use movies_core::storage::{
    AttributeType, KeyAttribute, Result, StoreError, TableDescription, TableSchema, TableStatus,
};

use super::error::{map_build_error, map_sdk_error};
use crate::config::TableWaitPolicy;

/// Fetches the current table description.
///
/// A missing table surfaces as a `ResourceNotFoundException` service error.
pub async fn describe_table(client: &Client, table_name: &str) -> Result<TableDescription> {
    let response = client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(map_sdk_error)?;

    let table = response.table().ok_or_else(|| {
        StoreError::InvalidData(format!("DescribeTable returned no table for {}", table_name))
    })?;

    let status = match table.table_status() {
        Some(aws_sdk_dynamodb::types::TableStatus::Active) => TableStatus::Active,
        Some(aws_sdk_dynamodb::types::TableStatus::Creating) => TableStatus::Creating,
        Some(aws_sdk_dynamodb::types::TableStatus::Updating) => TableStatus::Updating,
        Some(aws_sdk_dynamodb::types::TableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Other,
    };

    Ok(TableDescription {
        name: table.table_name().unwrap_or(table_name).to_string(),
        status,
        item_count: table.item_count(),
    })
}

/// Issues table creation for the given schema. Does not wait.
pub async fn create_table(client: &Client, schema: &TableSchema) -> Result<()> {
    let mut key_schema = vec![key_schema_element(&schema.partition_key, KeyType::Hash)?];
    let mut attribute_definitions = vec![attribute_definition(&schema.partition_key)?];

    if let Some(sk) = &schema.sort_key {
        key_schema.push(key_schema_element(sk, KeyType::Range)?);
        attribute_definitions.push(attribute_definition(sk)?);
    }

    let throughput = ProvisionedThroughput::builder()
        .read_capacity_units(schema.throughput.read_capacity_units)
        .write_capacity_units(schema.throughput.write_capacity_units)
        .build()
        .map_err(map_build_error)?;

    client
        .create_table()
        .table_name(&schema.table_name)
        .set_key_schema(Some(key_schema))
        .set_attribute_definitions(Some(attribute_definitions))
        .billing_mode(BillingMode::Provisioned)
        .provisioned_throughput(throughput)
        .send()
        .await
        .map_err(map_sdk_error)?;

    Ok(())
}

/// Issues table deletion. Does not wait.
pub async fn delete_table(client: &Client, table_name: &str) -> Result<()> {
    client
        .delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(map_sdk_error)?;
    Ok(())
}

/// Lists every table name, following `LastEvaluatedTableName` to the end.
pub async fn list_tables(client: &Client) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut exclusive_start = None;

    loop {
        let output = client
            .list_tables()
            .set_exclusive_start_table_name(exclusive_start)
            .send()
            .await
            .map_err(map_sdk_error)?;

        names.extend(output.table_names().iter().cloned());

        exclusive_start = output.last_evaluated_table_name().map(str::to_string);
        if exclusive_start.is_none() {
            break;
        }
    }

    Ok(names)
}

/// Polls until the table reports ACTIVE.
///
/// A not-found answer right after creation is treated as "not ready yet".
pub async fn wait_for_table_active(
    client: &Client,
    table_name: &str,
    policy: &TableWaitPolicy,
) -> Result<TableDescription> {
    for _ in 0..policy.max_attempts {
        match describe_table(client, table_name).await {
            Ok(description) if description.status == TableStatus::Active => {
                return Ok(description);
            }
            Ok(_) => {}
            Err(err) if err.is_resource_not_found() => {}
            Err(err) => return Err(err),
        }
        tokio::time::sleep(policy.delay).await;
    }

    Err(StoreError::TableWaitTimeout {
        table_name: table_name.to_string(),
    })
}

/// Polls until the service no longer finds the table.
pub async fn wait_for_table_deleted(
    client: &Client,
    table_name: &str,
    policy: &TableWaitPolicy,
) -> Result<()> {
    for _ in 0..policy.max_attempts {
        match describe_table(client, table_name).await {
            Ok(_) => {}
            Err(err) if err.is_resource_not_found() => return Ok(()),
            Err(err) => return Err(err),
        }
        tokio::time::sleep(policy.delay).await;
    }

    Err(StoreError::TableWaitTimeout {
        table_name: table_name.to_string(),
    })
}

fn key_schema_element(key: &KeyAttribute, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()
        .map_err(map_build_error)
}

fn attribute_definition(key: &KeyAttribute) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(to_scalar_type(&key.attribute_type))
        .build()
        .map_err(map_build_error)
}

fn to_scalar_type(attr_type: &AttributeType) -> ScalarAttributeType {
    match attr_type {
        AttributeType::Number => ScalarAttributeType::N,
        AttributeType::String => ScalarAttributeType::S,
    }
}
