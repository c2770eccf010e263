use serde::{Deserialize, Serialize};

use crate::movie::MovieKey;

use super::StoreError;

/// Reference to a remote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableHandle {
    pub name: String,
}

impl TableHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Table status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    /// Any status this crate does not act on (archiving, inaccessible, ...).
    Other,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Other => "OTHER",
        };
        f.write_str(label)
    }
}

/// Table metadata returned by a describe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub status: TableStatus,
    pub item_count: Option<i64>,
}

impl TableDescription {
    /// Returns a handle to the described table.
    pub fn handle(&self) -> TableHandle {
        TableHandle::new(&self.name)
    }
}

/// Outcome of checking whether a table exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableExistence {
    /// The table exists; its handle is now cached.
    Found,
    /// The service reported the table as missing.
    NotFound,
    /// The check itself failed for any other reason.
    Failed(StoreError),
}

/// One page of a paged read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` when the read is exhausted.
    pub last_evaluated_key: Option<MovieKey>,
}

impl<T> Page<T> {
    /// Returns true if more pages remain.
    pub fn has_more(&self) -> bool {
        self.last_evaluated_key.is_some()
    }
}
