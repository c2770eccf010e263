//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and movie types.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use movies_core::movie::{Movie, MovieInfo, MovieKey, MovieSummary, UpdatedInfo};
use movies_core::storage::StoreError;
use rust_decimal::Decimal;

use super::keys::{self, INFO, PLOT, RATING, TITLE, YEAR};

type Item = HashMap<String, AttributeValue>;

// ============================================================================
// Movie conversions
// ============================================================================

/// Convert a Movie to a DynamoDB item.
pub fn movie_to_item(movie: &Movie) -> Item {
    let mut item = keys::key_attributes(&movie.key());
    item.insert(
        INFO.to_string(),
        AttributeValue::M(HashMap::from([
            (PLOT.to_string(), AttributeValue::S(movie.info.plot.clone())),
            (RATING.to_string(), decimal_value(movie.info.rating)),
        ])),
    );
    item
}

/// Convert a DynamoDB item to a Movie.
pub fn item_to_movie(item: &Item) -> Result<Movie, StoreError> {
    let info = get_map(item, INFO)?;

    Ok(Movie {
        year: get_year(item)?,
        title: get_string(item, TITLE)?,
        info: MovieInfo {
            plot: get_string(info, PLOT)?,
            rating: get_decimal(info, RATING)?,
        },
    })
}

/// Convert a projected scan item to a MovieSummary.
pub fn item_to_summary(item: &Item) -> Result<MovieSummary, StoreError> {
    Ok(MovieSummary {
        year: get_year(item)?,
        title: get_string(item, TITLE)?,
        rating: get_decimal(get_map(item, INFO)?, RATING)?,
    })
}

/// Convert the `UPDATED_NEW` attributes of an update to UpdatedInfo.
pub fn attributes_to_updated_info(attributes: &Item) -> Result<UpdatedInfo, StoreError> {
    let info = get_map(attributes, INFO)?;

    Ok(UpdatedInfo {
        rating: get_decimal(info, RATING)?,
        plot: get_string(info, PLOT)?,
    })
}

/// Convert a `LastEvaluatedKey` to a MovieKey.
pub fn item_to_key(item: &Item) -> Result<MovieKey, StoreError> {
    Ok(MovieKey::new(get_year(item)?, get_string(item, TITLE)?))
}

/// Encode an exact decimal as a DynamoDB number.
pub fn decimal_value(value: Decimal) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(item: &Item, key: &str) -> Result<String, StoreError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get a required number attribute in its wire form.
fn get_number<'a>(item: &'a Item, key: &str) -> Result<&'a str, StoreError> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .map(|s| s.as_str())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get a required map attribute.
fn get_map<'a>(item: &'a Item, key: &str) -> Result<&'a Item, StoreError> {
    item.get(key)
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get the partition key.
fn get_year(item: &Item) -> Result<i32, StoreError> {
    let n = get_number(item, YEAR)?;
    n.parse()
        .map_err(|e| StoreError::InvalidData(format!("Invalid year {}: {}", n, e)))
}

/// Get a required decimal attribute without going through a float.
fn get_decimal(item: &Item, key: &str) -> Result<Decimal, StoreError> {
    let n = get_number(item, key)?;
    Decimal::from_str(n)
        .or_else(|_| Decimal::from_scientific(n))
        .map_err(|e| StoreError::InvalidData(format!("Invalid decimal {} {}: {}", key, n, e)))
}
