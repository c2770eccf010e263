use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::movie::{Movie, MovieKey, MovieSummary, UpdatedInfo, YearRange};

use super::{Page, Result, TableDescription, TableSchema};

/// Boundary to the remote table service.
///
/// Every method is one request (or a blocking wait delegated to the backend)
/// and reports service faults as [`super::StoreError::Service`] with the
/// service's own error code. Paging is exposed one page at a time so callers
/// decide how to follow continuation tokens.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Loads the metadata of a table.
    ///
    /// A missing table is reported as a `ResourceNotFoundException` service
    /// error, not as `Ok`.
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription>;

    /// Creates a table and returns once the service reports it active.
    async fn create_table(&self, schema: &TableSchema) -> Result<TableDescription>;

    /// Deletes a table and returns once the service no longer finds it.
    async fn delete_table(&self, table_name: &str) -> Result<()>;

    /// Lists the names of every table visible to the caller.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Writes a movie, replacing any existing record with the same key.
    async fn put_movie(&self, table_name: &str, movie: &Movie) -> Result<()>;

    /// Reads a movie by key.
    async fn get_movie(&self, table_name: &str, key: &MovieKey) -> Result<Option<Movie>>;

    /// Sets `info.rating` and `info.plot`, returning their new values.
    async fn update_movie_info(
        &self,
        table_name: &str,
        key: &MovieKey,
        rating: Decimal,
        plot: &str,
    ) -> Result<UpdatedInfo>;

    /// Deletes a movie by key; deleting a missing key is not an error.
    async fn delete_movie(&self, table_name: &str, key: &MovieKey) -> Result<()>;

    /// Writes many movies, owning chunking and the retry of unprocessed items.
    async fn write_batch(&self, table_name: &str, movies: &[Movie]) -> Result<()>;

    /// Reads one page of the movies released in `year`.
    async fn query_page(
        &self,
        table_name: &str,
        year: i32,
        exclusive_start_key: Option<MovieKey>,
    ) -> Result<Page<Movie>>;

    /// Reads one page of a full scan filtered to `range`, projected to summaries.
    ///
    /// The filter runs after the read, so a page may be empty while a
    /// continuation token is still returned.
    async fn scan_page(
        &self,
        table_name: &str,
        range: YearRange,
        exclusive_start_key: Option<MovieKey>,
    ) -> Result<Page<MovieSummary>>;
}
