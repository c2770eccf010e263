use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::YearRangeError;

/// Nested attributes stored under `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieInfo {
    pub plot: String,
    /// Exact decimal; never round-tripped through a float.
    pub rating: Decimal,
}

/// A movie record, keyed by release year and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Partition key.
    pub year: i32,
    /// Sort key.
    pub title: String,
    pub info: MovieInfo,
}

impl Movie {
    /// Creates a new movie record.
    pub fn new(
        year: i32,
        title: impl Into<String>,
        plot: impl Into<String>,
        rating: Decimal,
    ) -> Self {
        Self {
            year,
            title: title.into(),
            info: MovieInfo {
                plot: plot.into(),
                rating,
            },
        }
    }

    /// Returns the primary key of this record.
    pub fn key(&self) -> MovieKey {
        MovieKey::new(self.year, self.title.clone())
    }

    /// Returns the projection a scan would produce for this record.
    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            year: self.year,
            title: self.title.clone(),
            rating: self.info.rating,
        }
    }
}

/// Primary key of a movie record.
///
/// Also serves as the continuation token of paged reads: on the base table the
/// service's `LastEvaluatedKey` holds exactly these two attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MovieKey {
    pub year: i32,
    pub title: String,
}

impl MovieKey {
    pub fn new(year: i32, title: impl Into<String>) -> Self {
        Self {
            year,
            title: title.into(),
        }
    }
}

impl std::fmt::Display for MovieKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.year)
    }
}

/// Scan projection: `year`, `title` and `info.rating`, without the plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub year: i32,
    pub title: String,
    pub rating: Decimal,
}

/// New values returned by a partial update of `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedInfo {
    pub rating: Decimal,
    pub plot: String,
}

/// A range of release years, inclusive on both ends.
///
/// Only constructed through [`YearRange::new`], deserialization included, so
/// `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "YearBounds")]
pub struct YearRange {
    start: i32,
    end: i32,
}

#[derive(Deserialize)]
struct YearBounds {
    start: i32,
    end: i32,
}

impl TryFrom<YearBounds> for YearRange {
    type Error = YearRangeError;

    fn try_from(bounds: YearBounds) -> Result<Self, Self::Error> {
        YearRange::new(bounds.start, bounds.end)
    }
}

impl YearRange {
    /// Creates a new year range, validating that start <= end.
    pub fn new(start: i32, end: i32) -> Result<Self, YearRangeError> {
        if start > end {
            return Err(YearRangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Returns true if the year falls inside the range.
    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}
