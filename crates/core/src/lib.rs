//! Functional core for the movies catalog.
//!
//! Pure data types describing movie records and the table that stores them,
//! plus the [`storage::TableBackend`] seam the imperative shell implements.
//! Nothing in this crate performs I/O.

pub mod movie;
pub mod storage;
