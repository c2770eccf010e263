//! Storage backend implementations.
//!
//! This module provides concrete implementations of the
//! `movies_core::storage::TableBackend` trait.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//! - `inmemory`: In-memory backend with paging emulation and failure injection,
//!   always compiled for this crate's own tests
//!
//! Build without the AWS SDK:
//! ```bash
//! cargo build -p movies --no-default-features
//! ```

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(any(test, feature = "inmemory"))]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbBackend;

#[cfg(any(test, feature = "inmemory"))]
pub use inmemory::InMemoryBackend;
