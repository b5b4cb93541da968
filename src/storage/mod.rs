//! Storage module for persisting harvested listings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The durable dedup lookup and conflict-ignoring batch insert
//! - Listing CRUD
//! - Harvest session bookkeeping

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    ListingRepository, SessionLog, SessionTotals, Store, StoreError, StoreResult,
};

use crate::extract::Listing;

/// Represents a stored listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub id: i64,
    pub listing: Listing,
    pub created_at: String,
    pub updated_at: String,
}

/// Represents a harvest session
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSessionRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: SessionStatus,
    pub cycles: u32,
    pub discovered: u64,
    pub inserted: u64,
    pub error_message: Option<String>,
}

/// Status of a harvest session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        for status in &[
            SessionStatus::Running,
            SessionStatus::Completed,
            SessionStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = SessionStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_session_status_invalid() {
        assert_eq!(SessionStatus::from_db_string("interrupted"), None);
    }
}
