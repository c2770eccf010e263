//! In-memory table backend implementation.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use movies_core::movie::{Movie, MovieKey, MovieSummary, UpdatedInfo, YearRange};
use movies_core::storage::{
    Page, Result, StoreError, TableBackend, TableDescription, TableSchema, TableStatus,
    RESOURCE_IN_USE, RESOURCE_NOT_FOUND, VALIDATION_ERROR,
};

type Table = BTreeMap<MovieKey, Movie>;

/// In-memory storage backend for testing.
///
/// Tables live in a `BTreeMap` keyed by `(year, title)`, so reads come back in
/// key order like a single-partition scan would. Data is not persisted and
/// will be lost when the backend is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<BTreeMap<String, Table>>>,
    /// Maximum items read per page; `None` reads everything at once.
    page_size: Option<usize>,
    /// Error returned by the next call, then cleared.
    next_failure: Arc<RwLock<Option<StoreError>>>,
    page_requests: Arc<AtomicUsize>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates a new backend with no tables.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: None,
            next_failure: Arc::new(RwLock::new(None)),
            page_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Limits how many items each query or scan page reads.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Makes the next backend call fail with `error`.
    pub async fn fail_next(&self, error: StoreError) {
        *self.next_failure.write().await = Some(error);
    }

    /// Number of query and scan pages served so far.
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    async fn check_failure(&self) -> Result<()> {
        match self.next_failure.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Reads one page of `candidates` and applies `filter` after the read.
    fn read_page<'a, T>(
        &self,
        candidates: impl Iterator<Item = (&'a MovieKey, &'a Movie)>,
        filter: impl Fn(&Movie) -> Option<T>,
    ) -> Page<T> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        let mut candidates = candidates.peekable();
        let limit = self.page_size.unwrap_or(usize::MAX);
        let mut items = Vec::new();
        let mut last_read = None;

        for _ in 0..limit {
            let Some((key, movie)) = candidates.next() else {
                break;
            };
            last_read = Some(key.clone());
            if let Some(item) = filter(movie) {
                items.push(item);
            }
        }

        let last_evaluated_key = if candidates.peek().is_some() {
            last_read
        } else {
            None
        };

        Page {
            items,
            last_evaluated_key,
        }
    }
}

fn table_not_found(table_name: &str) -> StoreError {
    StoreError::service(
        RESOURCE_NOT_FOUND,
        format!("Requested resource not found: Table: {} not found", table_name),
    )
}

fn lower_bound(exclusive_start_key: Option<MovieKey>) -> Bound<MovieKey> {
    match exclusive_start_key {
        Some(key) => Bound::Excluded(key),
        None => Bound::Unbounded,
    }
}

#[async_trait]
impl TableBackend for InMemoryBackend {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        self.check_failure().await?;
        let tables = self.tables.read().await;
        let table = tables
            .get(table_name)
            .ok_or_else(|| table_not_found(table_name))?;

        Ok(TableDescription {
            name: table_name.to_string(),
            status: TableStatus::Active,
            item_count: Some(table.len() as i64),
        })
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<TableDescription> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;
        if tables.contains_key(&schema.table_name) {
            return Err(StoreError::service(
                RESOURCE_IN_USE,
                format!("Table already exists: {}", schema.table_name),
            ));
        }
        tables.insert(schema.table_name.clone(), Table::new());

        Ok(TableDescription {
            name: schema.table_name.clone(),
            status: TableStatus::Active,
            item_count: Some(0),
        })
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;
        if tables.remove(table_name).is_none() {
            return Err(table_not_found(table_name));
        }
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;
        Ok(tables.keys().cloned().collect())
    }

    async fn put_movie(&self, table_name: &str, movie: &Movie) -> Result<()> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        table.insert(movie.key(), movie.clone());
        Ok(())
    }

    async fn get_movie(&self, table_name: &str, key: &MovieKey) -> Result<Option<Movie>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;
        let table = tables
            .get(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        Ok(table.get(key).cloned())
    }

    async fn update_movie_info(
        &self,
        table_name: &str,
        key: &MovieKey,
        rating: Decimal,
        plot: &str,
    ) -> Result<UpdatedInfo> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;

        // Setting a nested path on a missing item has no `info` map to write into.
        let movie = table.get_mut(key).ok_or_else(|| {
            StoreError::service(
                VALIDATION_ERROR,
                "The document path provided in the update expression is invalid for update",
            )
        })?;
        movie.info.rating = rating;
        movie.info.plot = plot.to_string();

        Ok(UpdatedInfo {
            rating,
            plot: plot.to_string(),
        })
    }

    async fn delete_movie(&self, table_name: &str, key: &MovieKey) -> Result<()> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        table.remove(key);
        Ok(())
    }

    async fn write_batch(&self, table_name: &str, movies: &[Movie]) -> Result<()> {
        self.check_failure().await?;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        for movie in movies {
            table.insert(movie.key(), movie.clone());
        }
        Ok(())
    }

    async fn query_page(
        &self,
        table_name: &str,
        year: i32,
        exclusive_start_key: Option<MovieKey>,
    ) -> Result<Page<Movie>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;
        let table = tables
            .get(table_name)
            .ok_or_else(|| table_not_found(table_name))?;

        let partition = table
            .range((lower_bound(exclusive_start_key), Bound::Unbounded))
            .filter(|(key, _)| key.year == year);

        Ok(self.read_page(partition, |movie| Some(movie.clone())))
    }

    async fn scan_page(
        &self,
        table_name: &str,
        range: YearRange,
        exclusive_start_key: Option<MovieKey>,
    ) -> Result<Page<MovieSummary>> {
        self.check_failure().await?;
        let tables = self.tables.read().await;
        let table = tables
            .get(table_name)
            .ok_or_else(|| table_not_found(table_name))?;

        let everything = table.range((lower_bound(exclusive_start_key), Bound::Unbounded));

        Ok(self.read_page(everything, |movie| {
            range.contains(movie.year).then(|| movie.summary())
        }))
    }
}
