//! The movie catalog facade.
//!
//! [`MovieCatalog`] caches the handle of the table it works on and forwards
//! each operation to a [`TableBackend`]. Failures are logged with the service
//! code and message and then returned unchanged; the only error it absorbs is
//! `ResourceNotFoundException` while checking whether the table exists.

use rust_decimal::Decimal;
use tracing::{Instrument, Span};

use movies_core::movie::{Movie, MovieKey, MovieSummary, UpdatedInfo, YearRange};
use movies_core::storage::{
    movies_table_schema, Result, StoreError, TableBackend, TableExistence, TableHandle,
};

/// Movie records stored in a single table, keyed by year and title.
pub struct MovieCatalog<B> {
    backend: B,
    /// Set by `exists` or `create_table`, cleared by `delete_table`.
    table: Option<TableHandle>,
    span: Span,
}

impl<B: TableBackend> MovieCatalog<B> {
    /// Creates a catalog with its own `movie_catalog` span.
    ///
    /// The span's `table` field is recorded once a table handle is cached.
    pub fn new(backend: B) -> Self {
        Self::with_span(
            backend,
            tracing::info_span!("movie_catalog", table = tracing::field::Empty),
        )
    }

    /// Creates a catalog that logs through the given span.
    ///
    /// The span should declare a `table` field for the cached table to show up.
    pub fn with_span(backend: B, span: Span) -> Self {
        Self {
            backend,
            table: None,
            span,
        }
    }

    /// Returns the cached table handle, if any.
    pub fn table(&self) -> Option<&TableHandle> {
        self.table.as_ref()
    }

    // ========================================================================
    // Table management
    // ========================================================================

    /// Checks whether `table_name` exists, caching its handle when it does.
    pub async fn exists(&mut self, table_name: &str) -> TableExistence {
        let described = self
            .backend
            .describe_table(table_name)
            .instrument(self.span.clone())
            .await;

        match described {
            Ok(description) => {
                self.span.in_scope(|| {
                    tracing::debug!(
                        table = %description.name,
                        status = %description.status,
                        item_count = description.item_count.unwrap_or_default(),
                        "Table found"
                    );
                });
                self.cache_handle(description.handle());
                TableExistence::Found
            }
            Err(err) if err.is_resource_not_found() => TableExistence::NotFound,
            Err(err) => {
                self.log_failure(&err, "Couldn't check for existence of table", table_name);
                TableExistence::Failed(err)
            }
        }
    }

    /// Creates the movies table and waits until it is active.
    pub async fn create_table(&mut self, table_name: &str) -> Result<&TableHandle> {
        let schema = movies_table_schema(table_name);

        let description = self
            .backend
            .create_table(&schema)
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't create table", table_name))?;

        self.span.in_scope(|| {
            tracing::info!(table = %description.name, status = %description.status, "Table created");
        });
        Ok(self.cache_handle(description.handle()))
    }

    /// Deletes the cached table, waits until it is gone and forgets the handle.
    pub async fn delete_table(&mut self) -> Result<()> {
        let table_name = self.table_name()?.to_string();

        self.backend
            .delete_table(&table_name)
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't delete table", &table_name))?;

        self.table = None;
        Ok(())
    }

    /// Lists every table visible to the caller's credentials.
    pub async fn list_tables(&self) -> Result<Vec<TableHandle>> {
        let names = self
            .backend
            .list_tables()
            .instrument(self.span.clone())
            .await
            .map_err(|err| {
                self.span.in_scope(|| {
                    tracing::error!(
                        code = err.code().unwrap_or("-"),
                        message = %err.message(),
                        "Couldn't list tables"
                    );
                });
                err
            })?;

        self.span.in_scope(|| {
            for name in &names {
                tracing::info!(table = %name, "Found table");
            }
        });
        Ok(names.into_iter().map(TableHandle::new).collect())
    }

    // ========================================================================
    // Item operations
    // ========================================================================

    /// Adds a movie, replacing any movie with the same year and title.
    pub async fn put_movie(&self, movie: &Movie) -> Result<()> {
        let table_name = self.table_name()?;
        self.span.in_scope(|| {
            tracing::info!(title = %movie.title, table = %table_name, "Adding movie");
        });

        self.backend
            .put_movie(table_name, movie)
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't add movie", table_name))
    }

    /// Gets a movie by title and year; `None` when there is no such movie.
    pub async fn get_movie(&self, title: &str, year: i32) -> Result<Option<Movie>> {
        let table_name = self.table_name()?;

        self.backend
            .get_movie(table_name, &MovieKey::new(year, title))
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't get movie", table_name))
    }

    /// Sets a movie's rating and plot, returning only the new values.
    pub async fn update_movie(
        &self,
        title: &str,
        year: i32,
        rating: Decimal,
        plot: &str,
    ) -> Result<UpdatedInfo> {
        let table_name = self.table_name()?;

        self.backend
            .update_movie_info(table_name, &MovieKey::new(year, title), rating, plot)
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't update movie", table_name))
    }

    /// Deletes a movie; deleting a movie that does not exist succeeds.
    pub async fn delete_movie(&self, title: &str, year: i32) -> Result<()> {
        let table_name = self.table_name()?;

        self.backend
            .delete_movie(table_name, &MovieKey::new(year, title))
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't delete movie", table_name))
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Writes many movies through the backend's batch writer.
    ///
    /// Chunking and retrying unprocessed items belong to the backend.
    pub async fn write_batch(&self, movies: &[Movie]) -> Result<()> {
        let table_name = self.table_name()?;
        if movies.is_empty() {
            return Ok(());
        }

        self.backend
            .write_batch(table_name, movies)
            .instrument(self.span.clone())
            .await
            .map_err(|err| self.log_failure(&err, "Couldn't write to table", table_name))
    }

    /// Gets every movie released in `year`, following continuation tokens.
    pub async fn query_movies(&self, year: i32) -> Result<Vec<Movie>> {
        let table_name = self.table_name()?;
        let mut movies = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .backend
                .query_page(table_name, year, start_key)
                .instrument(self.span.clone())
                .await
                .map_err(|err| self.log_failure(&err, "Couldn't query movies", table_name))?;

            let more = page.has_more();
            movies.extend(page.items);
            start_key = page.last_evaluated_key;
            if !more {
                break;
            }
        }

        Ok(movies)
    }

    /// Scans for movies released within `range`, projected to year, title and rating.
    ///
    /// The year filter is applied after the read: every item in the table
    /// costs read capacity, including the ones filtered out.
    pub async fn scan_movies(&self, range: YearRange) -> Result<Vec<MovieSummary>> {
        let table_name = self.table_name()?;
        let mut movies = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .backend
                .scan_page(table_name, range, start_key)
                .instrument(self.span.clone())
                .await
                .map_err(|err| self.log_failure(&err, "Couldn't scan movies", table_name))?;

            let more = page.has_more();
            movies.extend(page.items);
            start_key = page.last_evaluated_key;
            if !more {
                break;
            }
        }

        Ok(movies)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn cache_handle(&mut self, handle: TableHandle) -> &TableHandle {
        self.span.record("table", handle.name.as_str());
        self.table.insert(handle)
    }

    fn table_name(&self) -> Result<&str> {
        match &self.table {
            Some(handle) => Ok(&handle.name),
            None => {
                let err = StoreError::TableNotLoaded;
                self.span.in_scope(|| tracing::error!(error = %err, "No table loaded"));
                Err(err)
            }
        }
    }

    /// Logs a failed operation and hands the error back for propagation.
    fn log_failure(&self, err: &StoreError, action: &str, table_name: &str) -> StoreError {
        self.span.in_scope(|| {
            tracing::error!(
                table = %table_name,
                code = err.code().unwrap_or("-"),
                message = %err.message(),
                "{action}"
            );
        });
        err.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use movies_core::movie::demo_movies;
    use movies_core::storage::{RESOURCE_NOT_FOUND, VALIDATION_ERROR};

    use crate::storage::InMemoryBackend;

    fn rating(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    async fn catalog_with_table(backend: InMemoryBackend) -> MovieCatalog<InMemoryBackend> {
        let mut catalog = MovieCatalog::new(backend);
        catalog.create_table("movies").await.unwrap();
        catalog
    }

    fn sample_movies() -> Vec<Movie> {
        vec![
            Movie::new(1940, "Fantasia", "Music", rating("7.7")),
            Movie::new(1950, "Rashomon", "Four accounts", rating("8.2")),
            Movie::new(1977, "Star Wars", "A long time ago", rating("5.0")),
            Movie::new(1999, "Fight Club", "Soap", rating("8.8")),
            Movie::new(1999, "The Matrix", "Red pill", rating("8.7")),
            Movie::new(2015, "The Big New Movie", "Nothing happens at all", rating("0.0")),
            Movie::new(2016, "Arrival", "Heptapods", rating("7.9")),
        ]
    }

    // ------------------------------------------------------------------------
    // Table management
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_exists_before_and_after_create() {
        let mut catalog = MovieCatalog::new(InMemoryBackend::new());

        assert_eq!(catalog.exists("movies").await, TableExistence::NotFound);
        assert!(catalog.table().is_none());

        catalog.create_table("movies").await.unwrap();

        assert_eq!(catalog.exists("movies").await, TableExistence::Found);
        assert_eq!(catalog.table(), Some(&TableHandle::new("movies")));
    }

    #[tokio::test]
    async fn test_exists_caches_handle_of_existing_table() {
        let backend = InMemoryBackend::new();
        catalog_with_table(backend.clone()).await;

        let mut catalog = MovieCatalog::new(backend);
        assert_eq!(catalog.exists("movies").await, TableExistence::Found);

        catalog.put_movie(&demo_movies()[0]).await.unwrap();
    }

    #[tokio::test]
    async fn test_exists_reports_other_failures() {
        let backend = InMemoryBackend::new();
        backend
            .fail_next(StoreError::service("AccessDeniedException", "denied"))
            .await;
        let mut catalog = MovieCatalog::new(backend);

        let existence = catalog.exists("movies").await;

        assert_eq!(
            existence,
            TableExistence::Failed(StoreError::service("AccessDeniedException", "denied"))
        );
        assert!(catalog.table().is_none());
    }

    #[tokio::test]
    async fn test_create_returns_handle() {
        let mut catalog = MovieCatalog::new(InMemoryBackend::new());

        let handle = catalog.create_table("movies").await.unwrap();

        assert_eq!(handle.name, "movies");
    }

    #[tokio::test]
    async fn test_create_existing_table_propagates_error() {
        let mut catalog = catalog_with_table(InMemoryBackend::new()).await;

        let error = catalog.create_table("movies").await.unwrap_err();

        assert_eq!(error.code(), Some("ResourceInUseException"));
    }

    #[tokio::test]
    async fn test_delete_table_clears_handle() {
        let mut catalog = catalog_with_table(InMemoryBackend::new()).await;

        catalog.delete_table().await.unwrap();

        assert!(catalog.table().is_none());
        assert_eq!(catalog.exists("movies").await, TableExistence::NotFound);
    }

    #[tokio::test]
    async fn test_delete_table_without_handle() {
        let mut catalog = MovieCatalog::new(InMemoryBackend::new());

        let error = catalog.delete_table().await.unwrap_err();

        assert_eq!(error, StoreError::TableNotLoaded);
    }

    #[tokio::test]
    async fn test_delete_table_failure_keeps_handle() {
        let backend = InMemoryBackend::new();
        let mut catalog = catalog_with_table(backend.clone()).await;
        backend
            .fail_next(StoreError::service("ResourceInUseException", "busy"))
            .await;

        assert!(catalog.delete_table().await.is_err());
        assert_eq!(catalog.table(), Some(&TableHandle::new("movies")));
    }

    #[tokio::test]
    async fn test_list_tables() {
        let backend = InMemoryBackend::new();
        let mut catalog = MovieCatalog::new(backend);
        catalog.create_table("movies").await.unwrap();
        catalog.create_table("series").await.unwrap();

        let tables = catalog.list_tables().await.unwrap();

        assert_eq!(
            tables,
            vec![TableHandle::new("movies"), TableHandle::new("series")]
        );
    }

    // ------------------------------------------------------------------------
    // Item operations
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_put_then_get_keeps_exact_rating() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;
        let movie = Movie::new(2015, "The Big New Movie", "Nothing happens", rating("0.10"));

        catalog.put_movie(&movie).await.unwrap();
        let retrieved = catalog
            .get_movie("The Big New Movie", 2015)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(retrieved.info.rating, rating("0.10"));
        assert_eq!(retrieved.info.rating.to_string(), "0.10");
    }

    #[tokio::test]
    async fn test_put_is_an_upsert() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;

        catalog
            .put_movie(&Movie::new(1977, "Star Wars", "Old", rating("5.0")))
            .await
            .unwrap();
        catalog
            .put_movie(&Movie::new(1977, "Star Wars", "New", rating("8.6")))
            .await
            .unwrap();

        let retrieved = catalog.get_movie("Star Wars", 1977).await.unwrap().unwrap();
        assert_eq!(retrieved.info.plot, "New");
    }

    #[tokio::test]
    async fn test_get_missing_movie_is_none() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;

        let retrieved = catalog.get_movie("Nothing", 2000).await.unwrap();

        assert!(retrieved.is_none());
    }

    #[tokio::test]
    async fn test_update_changes_only_rating_and_plot() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;
        catalog
            .put_movie(&Movie::new(1999, "The Matrix", "Red pill", rating("8.7")))
            .await
            .unwrap();

        let updated = catalog
            .update_movie("The Matrix", 1999, rating("9.1"), "Blue pill")
            .await
            .unwrap();

        assert_eq!(
            updated,
            UpdatedInfo {
                rating: rating("9.1"),
                plot: "Blue pill".to_string(),
            }
        );

        let retrieved = catalog.get_movie("The Matrix", 1999).await.unwrap().unwrap();
        assert_eq!(retrieved.year, 1999);
        assert_eq!(retrieved.title, "The Matrix");
        assert_eq!(retrieved.info.rating, rating("9.1"));
        assert_eq!(retrieved.info.plot, "Blue pill");
    }

    #[tokio::test]
    async fn test_update_missing_movie_propagates_error() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;

        let error = catalog
            .update_movie("Nothing", 2000, rating("1.0"), "plot")
            .await
            .unwrap_err();

        assert_eq!(error.code(), Some(VALIDATION_ERROR));
    }

    #[tokio::test]
    async fn test_delete_missing_movie_is_not_an_error() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;

        catalog.delete_movie("Nothing", 2000).await.unwrap();

        assert!(catalog.get_movie("Nothing", 2000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_movie() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;
        catalog.put_movie(&demo_movies()[0]).await.unwrap();

        catalog.delete_movie("The Matrix", 1999).await.unwrap();

        assert!(catalog.get_movie("The Matrix", 1999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_item_operations_need_a_table() {
        let catalog = MovieCatalog::new(InMemoryBackend::new());

        assert_eq!(
            catalog.put_movie(&demo_movies()[0]).await,
            Err(StoreError::TableNotLoaded)
        );
        assert_eq!(
            catalog.get_movie("The Matrix", 1999).await,
            Err(StoreError::TableNotLoaded)
        );
        assert_eq!(
            catalog.query_movies(1999).await,
            Err(StoreError::TableNotLoaded)
        );
    }

    #[tokio::test]
    async fn test_service_errors_pass_through_unchanged() {
        let backend = InMemoryBackend::new();
        let catalog = catalog_with_table(backend.clone()).await;
        let failure = StoreError::service(
            "ProvisionedThroughputExceededException",
            "Rate of requests exceeds the allowed throughput",
        );
        backend.fail_next(failure.clone()).await;

        assert_eq!(catalog.get_movie("The Matrix", 1999).await, Err(failure));
    }

    // ------------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_write_batch_empty_is_noop() {
        let backend = InMemoryBackend::new();
        let catalog = catalog_with_table(backend.clone()).await;
        backend
            .fail_next(StoreError::Connection("unreachable".to_string()))
            .await;

        catalog.write_batch(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_returns_only_that_year_unprojected() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;
        catalog.write_batch(&sample_movies()).await.unwrap();

        let movies = catalog.query_movies(1999).await.unwrap();

        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Fight Club", "The Matrix"]);
        assert_eq!(movies[1].info.plot, "Red pill");
    }

    #[tokio::test]
    async fn test_query_follows_continuation_tokens() {
        let backend = InMemoryBackend::new().with_page_size(1);
        let catalog = catalog_with_table(backend.clone()).await;
        catalog.write_batch(&sample_movies()).await.unwrap();

        let movies = catalog.query_movies(1999).await.unwrap();

        assert_eq!(movies.len(), 2);
        assert!(backend.page_requests() >= 2);
    }

    #[tokio::test]
    async fn test_scan_returns_range_projected() {
        let catalog = catalog_with_table(InMemoryBackend::new()).await;
        catalog.write_batch(&sample_movies()).await.unwrap();
        let range = YearRange::new(1950, 2015).unwrap();

        let movies = catalog.scan_movies(range).await.unwrap();

        let keys: Vec<(i32, &str)> = movies.iter().map(|m| (m.year, m.title.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (1950, "Rashomon"),
                (1977, "Star Wars"),
                (1999, "Fight Club"),
                (1999, "The Matrix"),
                (2015, "The Big New Movie"),
            ]
        );
        assert_eq!(movies[1].rating, rating("5.0"));
    }

    #[tokio::test]
    async fn test_scan_keeps_going_past_empty_pages() {
        let backend = InMemoryBackend::new().with_page_size(2);
        let catalog = catalog_with_table(backend.clone()).await;
        catalog.write_batch(&sample_movies()).await.unwrap();
        let range = YearRange::new(2016, 2016).unwrap();

        let movies = catalog.scan_movies(range).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Arrival");
        assert_eq!(backend.page_requests(), 4);
    }

    #[tokio::test]
    async fn test_scan_failure_propagates() {
        let backend = InMemoryBackend::new();
        let catalog = catalog_with_table(backend.clone()).await;
        catalog.write_batch(&sample_movies()).await.unwrap();
        backend
            .fail_next(StoreError::service(RESOURCE_NOT_FOUND, "gone"))
            .await;

        let result = catalog
            .scan_movies(YearRange::new(1950, 2015).unwrap())
            .await;

        assert!(result.unwrap_err().is_resource_not_found());
    }

    // ------------------------------------------------------------------------
    // Scenario
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let mut catalog = MovieCatalog::new(InMemoryBackend::new());

        catalog.create_table("movies").await.unwrap();
        catalog.write_batch(&demo_movies()).await.unwrap();

        let movies = catalog.query_movies(1999).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "The Matrix");

        catalog.delete_table().await.unwrap();
        assert_eq!(catalog.exists("movies").await, TableExistence::NotFound);
    }

    // ------------------------------------------------------------------------
    // Span
    // ------------------------------------------------------------------------

    mod span {
        use std::sync::{Arc, Mutex};

        use tracing::field::{Field, Visit};
        use tracing::span::{Id, Record};
        use tracing::Subscriber;
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        use super::*;

        /// Collects every value recorded into a span's `table` field.
        #[derive(Clone, Default)]
        struct TableRecorder(Arc<Mutex<Vec<String>>>);

        impl Visit for TableRecorder {
            fn record_str(&mut self, field: &Field, value: &str) {
                if field.name() == "table" {
                    self.0.lock().unwrap().push(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
                if field.name() == "table" {
                    self.0.lock().unwrap().push(format!("{:?}", value));
                }
            }
        }

        impl<S: Subscriber> Layer<S> for TableRecorder {
            fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
                values.record(&mut self.clone());
            }
        }

        #[tokio::test]
        async fn test_span_records_cached_table() {
            let recorder = TableRecorder::default();
            let subscriber = tracing_subscriber::registry().with(recorder.clone());
            let _guard = tracing::subscriber::set_default(subscriber);

            let backend = InMemoryBackend::new();
            catalog_with_table(backend.clone()).await;

            let mut catalog = MovieCatalog::new(backend);
            assert_eq!(catalog.exists("movies").await, TableExistence::Found);

            let recorded = recorder.0.lock().unwrap().clone();
            assert_eq!(recorded, vec!["movies".to_string(), "movies".to_string()]);
        }

        #[tokio::test]
        async fn test_span_table_stays_empty_when_missing() {
            let recorder = TableRecorder::default();
            let subscriber = tracing_subscriber::registry().with(recorder.clone());
            let _guard = tracing::subscriber::set_default(subscriber);

            let mut catalog = MovieCatalog::new(InMemoryBackend::new());
            assert_eq!(catalog.exists("movies").await, TableExistence::NotFound);

            assert!(recorder.0.lock().unwrap().is_empty());
        }
    }
}
