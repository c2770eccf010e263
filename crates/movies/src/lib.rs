//! Manage a DynamoDB table of movies keyed by release year and title.
//!
//! [`MovieCatalog`] is the facade: it caches the table handle, logs every
//! failure through its own span and delegates each request to a
//! [`movies_core::storage::TableBackend`].

pub mod catalog;
pub mod config;
pub mod storage;

pub use catalog::MovieCatalog;
