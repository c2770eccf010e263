use thiserror::Error;

/// Service error code returned when a table or index does not exist.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Service error code returned when creating a table that already exists.
pub const RESOURCE_IN_USE: &str = "ResourceInUseException";

/// Service error code returned for malformed requests and expressions.
pub const VALIDATION_ERROR: &str = "ValidationException";

/// Errors that can occur during table and item operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A fault reported by the database service itself.
    #[error("{code}: {message}")]
    Service { code: String, message: String },
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("No table loaded; check that it exists or create it first")]
    TableNotLoaded,
    #[error("Timed out waiting for table '{table_name}' to reach the expected state")]
    TableWaitTimeout { table_name: String },
    #[error("{count} items were still unprocessed after retrying")]
    UnprocessedItems { count: usize },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Creates a service error from a code and a message.
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the service error code, if this is a service error.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns the human readable part of the error.
    pub fn message(&self) -> String {
        match self {
            Self::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if the service reported that the resource does not exist.
    pub fn is_resource_not_found(&self) -> bool {
        self.code() == Some(RESOURCE_NOT_FOUND)
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
