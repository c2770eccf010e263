//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of `TableBackend` that
//! keeps every table in a `BTreeMap` wrapped in `Arc<RwLock<_>>`. It answers
//! with the same error codes and paging behavior as the service, which makes
//! it a stand-in for DynamoDB in tests and dry runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use movies::storage::inmemory::InMemoryBackend;
//!
//! let backend = InMemoryBackend::new().with_page_size(2);
//! // Use backend for testing...
//! ```

mod backend;

pub use backend::InMemoryBackend;
