//! Batch writer for DynamoDB.
//!
//! Owns everything a caller of `write_batch` should not care about:
//! - Splitting requests to respect the 25-item limit
//! - Re-submitting unprocessed items with exponential backoff

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use movies_core::movie::Movie;
use movies_core::storage::{Result, StoreError};

use super::conversions::movie_to_item;
use super::error::{map_build_error, map_sdk_error};

/// Maximum items per batch write request (DynamoDB limit).
pub const BATCH_WRITE_MAX_ITEMS: usize = 25;

/// Maximum retry attempts for unprocessed items.
const BATCH_WRITE_MAX_RETRIES: u32 = 5;

/// Base delay of the unprocessed-items backoff.
const BATCH_WRITE_BASE_DELAY: Duration = Duration::from_millis(50);

/// Writes movies in chunks, retrying whatever the service leaves unprocessed.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    client: Client,
    table_name: String,
}

impl BatchWriter {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Put every movie, returning how many were written.
    pub async fn put_all(&self, movies: &[Movie]) -> Result<usize> {
        let requests = movies
            .iter()
            .map(put_request)
            .collect::<Result<Vec<_>>>()?;

        for chunk in requests.chunks(BATCH_WRITE_MAX_ITEMS) {
            self.write_chunk(chunk.to_vec()).await?;
        }

        Ok(requests.len())
    }

    async fn write_chunk(&self, chunk: Vec<WriteRequest>) -> Result<()> {
        let mut pending = chunk;
        let mut retries = 0;

        loop {
            let output = self
                .client
                .batch_write_item()
                .set_request_items(Some(HashMap::from([(
                    self.table_name.clone(),
                    pending,
                )])))
                .send()
                .await
                .map_err(map_sdk_error)?;

            pending = output
                .unprocessed_items
                .and_then(|mut unprocessed| unprocessed.remove(&self.table_name))
                .unwrap_or_default();

            if pending.is_empty() {
                return Ok(());
            }

            if retries >= BATCH_WRITE_MAX_RETRIES {
                return Err(StoreError::UnprocessedItems {
                    count: pending.len(),
                });
            }

            retries += 1;
            tracing::debug!(
                table = %self.table_name,
                unprocessed = pending.len(),
                retry = retries,
                "Retrying unprocessed batch items"
            );
            tokio::time::sleep(backoff_delay(retries)).await;
        }
    }
}

fn put_request(movie: &Movie) -> Result<WriteRequest> {
    let put = PutRequest::builder()
        .set_item(Some(movie_to_item(movie)))
        .build()
        .map_err(map_build_error)?;

    Ok(WriteRequest::builder().put_request(put).build())
}

/// Delay before retry number `retry` (1-based).
fn backoff_delay(retry: u32) -> Duration {
    BATCH_WRITE_BASE_DELAY * (1 << retry)
}
