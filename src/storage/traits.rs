//! Storage traits and error types
//!
//! This module defines the capabilities the harvester and the CLI need from a
//! storage backend, and the associated error types.

use crate::extract::Listing;
use crate::storage::{HarvestSessionRecord, ListingRecord, SessionStatus};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Listing not found: {0}")]
    NotFound(i64),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// The durable side of the harvest pipeline
///
/// Implementations are shared between a running harvest and anything else
/// reading or writing listings, so both methods take `&self` and must be safe
/// to call concurrently.
pub trait Store: Send + Sync {
    /// Returns the subset of `links` that is already stored
    fn find_existing(&self, links: &[String]) -> StoreResult<HashSet<String>>;

    /// Inserts listings in one transaction, skipping any whose link is already stored
    ///
    /// A record that fails for any other reason is logged and skipped; the
    /// remaining records are still attempted and committed. Returns the number
    /// of rows actually inserted.
    fn insert_ignoring_conflicts(&self, listings: &[Listing]) -> StoreResult<usize>;
}

/// Plain CRUD over stored listings
pub trait ListingRepository: Send + Sync {
    /// Gets a listing by ID
    fn get_listing(&self, id: i64) -> StoreResult<Option<ListingRecord>>;

    /// Lists the most recently created listings, newest first
    fn list_listings(&self, limit: usize) -> StoreResult<Vec<ListingRecord>>;

    /// Inserts a single listing
    ///
    /// Unlike [`Store::insert_ignoring_conflicts`] a duplicate link is an error.
    fn create_listing(&self, listing: &Listing) -> StoreResult<ListingRecord>;

    /// Replaces the fields of an existing listing
    fn update_listing(&self, id: i64, listing: &Listing) -> StoreResult<ListingRecord>;

    /// Deletes a listing
    fn delete_listing(&self, id: i64) -> StoreResult<()>;

    /// Counts stored listings
    fn count_listings(&self) -> StoreResult<u64>;

    /// Counts stored listings per detected currency
    fn count_by_currency(&self) -> StoreResult<Vec<(Option<String>, u64)>>;
}

/// Bookkeeping of harvest runs
pub trait SessionLog: Send + Sync {
    /// Records the start of a harvest session and returns its ID
    fn begin_session(&self, config_hash: &str) -> StoreResult<i64>;

    /// Records how a harvest session ended
    fn finish_session(
        &self,
        session_id: i64,
        status: SessionStatus,
        totals: &SessionTotals,
        error_message: Option<&str>,
    ) -> StoreResult<()>;

    /// Gets the most recent sessions, newest first
    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<HarvestSessionRecord>>;
}

/// Counters recorded when a session finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub cycles: u32,
    pub discovered: u64,
    pub inserted: u64,
}
