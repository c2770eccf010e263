//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the
//! `TableBackend` trait using `aws-sdk-dynamodb`.

mod backend;
mod batch;
mod client;
mod conversions;
mod error;
mod keys;
#[cfg(test)]
mod mock;
mod table;

pub use backend::DynamoDbBackend;
pub use client::create_client;
