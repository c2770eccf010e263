//! Mocked DynamoDB clients for unit tests.

use std::time::Duration;

use aws_sdk_dynamodb::error::ErrorMetadata;
use aws_sdk_dynamodb::operation::describe_table::{DescribeTableError, DescribeTableOutput};
use aws_sdk_dynamodb::types::error::ResourceNotFoundException;
use aws_sdk_dynamodb::types::{TableDescription, TableStatus};
use aws_sdk_dynamodb::Client;
use aws_smithy_mocks::{mock_client, Rule, RuleMode};
use movies_core::storage::RESOURCE_NOT_FOUND;

use crate::config::TableWaitPolicy;

/// Client that answers from `rules`, in order.
pub fn client(rules: &[&Rule]) -> Client {
    mock_client!(aws_sdk_dynamodb, RuleMode::Sequential, rules, |conf| conf
        .behavior_version_latest())
}

/// Polls up to `max_attempts` times without sleeping.
pub fn no_wait(max_attempts: u32) -> TableWaitPolicy {
    TableWaitPolicy {
        max_attempts,
        delay: Duration::ZERO,
    }
}

pub fn described(table_name: &str, status: TableStatus) -> DescribeTableOutput {
    DescribeTableOutput::builder()
        .table(
            TableDescription::builder()
                .table_name(table_name)
                .table_status(status)
                .item_count(0)
                .build(),
        )
        .build()
}

/// The error DescribeTable answers with for a missing table.
pub fn table_not_found(table_name: &str) -> DescribeTableError {
    let message = format!("Requested resource not found: Table: {} not found", table_name);
    DescribeTableError::ResourceNotFoundException(
        ResourceNotFoundException::builder()
            .message(&message)
            .meta(
                ErrorMetadata::builder()
                    .code(RESOURCE_NOT_FOUND)
                    .message(message)
                    .build(),
            )
            .build(),
    )
}

/// An error outside the modeled DescribeTable errors.
pub fn access_denied() -> DescribeTableError {
    DescribeTableError::generic(
        ErrorMetadata::builder()
            .code("AccessDeniedException")
            .message("User is not authorized to perform: dynamodb:DescribeTable")
            .build(),
    )
}
