mod error;
mod schema;
mod traits;
mod types;

pub use error::{Result, StoreError, RESOURCE_IN_USE, RESOURCE_NOT_FOUND, VALIDATION_ERROR};
pub use schema::{
    movies_table_schema, AttributeType, KeyAttribute, ProvisionedThroughput, TableSchema,
};
pub use traits::TableBackend;
pub use types::{Page, TableDescription, TableExistence, TableHandle, TableStatus};
