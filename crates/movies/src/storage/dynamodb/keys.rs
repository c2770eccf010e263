//! Attribute names, expressions and key construction for the movies table.
//!
//! `year` is a DynamoDB reserved word, so every expression that touches it
//! goes through the `#yr` placeholder.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use movies_core::movie::MovieKey;

// ============================================================================
// Attribute names
// ============================================================================

pub const YEAR: &str = "year";
pub const TITLE: &str = "title";
pub const INFO: &str = "info";
pub const PLOT: &str = "plot";
pub const RATING: &str = "rating";

/// Expression placeholder standing in for the reserved word `year`.
pub const YEAR_PLACEHOLDER: &str = "#yr";

// ============================================================================
// Expressions
// ============================================================================

/// Sets the two nested fields touched by a movie update.
pub const UPDATE_INFO_EXPRESSION: &str = "SET info.rating = :r, info.plot = :p";

/// Equality on the partition key.
pub const QUERY_BY_YEAR_EXPRESSION: &str = "#yr = :year";

/// Inclusive range on the partition key, evaluated after the read.
pub const SCAN_YEAR_RANGE_FILTER: &str = "#yr BETWEEN :start_yr AND :end_yr";

/// Attributes returned by a scan.
pub const SCAN_PROJECTION: &str = "#yr, title, info.rating";

// ============================================================================
// Keys
// ============================================================================

/// Build the primary key attribute map for a movie.
pub fn key_attributes(key: &MovieKey) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (YEAR.to_string(), year_value(key.year)),
        (TITLE.to_string(), AttributeValue::S(key.title.clone())),
    ])
}

/// Encode a release year as a DynamoDB number.
pub fn year_value(year: i32) -> AttributeValue {
    AttributeValue::N(year.to_string())
}
