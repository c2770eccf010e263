//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `movies_core::storage`.
//! Service errors keep the code and message the service sent; everything
//! else (dispatch failures, timeouts, bad requests) becomes a connection error.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use movies_core::storage::StoreError;

/// Fallback code for service errors that arrive without one.
const UNKNOWN_CODE: &str = "Unknown";

/// Map any SDK operation error to StoreError.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    match &err {
        SdkError::ServiceError(service) => service_error(service.err()),
        SdkError::TimeoutError(_) => {
            StoreError::Connection("Request to DynamoDB timed out".to_string())
        }
        _ => StoreError::Connection(DisplayErrorContext(&err).to_string()),
    }
}

/// Build a service StoreError from anything carrying error metadata.
pub fn service_error(err: &impl ProvideErrorMetadata) -> StoreError {
    StoreError::service(
        err.code().unwrap_or(UNKNOWN_CODE),
        err.message().unwrap_or_default(),
    )
}

/// Map a request builder failure (missing required field) to StoreError.
pub fn map_build_error(err: aws_sdk_dynamodb::error::BuildError) -> StoreError {
    StoreError::InvalidData(err.to_string())
}
