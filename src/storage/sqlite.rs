//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.
//! The connection sits behind a mutex so one store can be shared between the
//! ingestion consumer and any other reader or writer.

use crate::extract::Listing;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    ListingRepository, SessionLog, SessionTotals, Store, StoreError, StoreResult,
};
use crate::storage::{HarvestSessionRecord, ListingRecord, SessionStatus};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Upper bound on bound parameters per existence query
const LOOKUP_CHUNK: usize = 500;

const LISTING_COLUMNS: &str = "id, title, price, currency, year, mileage, location, link, \
                               raw_text, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, cycles, \
                               discovered, inserted, error_message";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<ListingRecord> {
    Ok(ListingRecord {
        id: row.get(0)?,
        listing: Listing {
            title: row.get(1)?,
            price: row.get(2)?,
            currency: row.get(3)?,
            year: row.get(4)?,
            mileage: row.get(5)?,
            location: row.get(6)?,
            link: row.get(7)?,
            raw_text: row.get(8)?,
        },
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<HarvestSessionRecord> {
    Ok(HarvestSessionRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: SessionStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(SessionStatus::Failed),
        cycles: row.get(5)?,
        discovered: row.get::<_, i64>(6)? as u64,
        inserted: row.get::<_, i64>(7)? as u64,
        error_message: row.get(8)?,
    })
}

fn fetch_listing(conn: &Connection, id: i64) -> StoreResult<Option<ListingRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {} FROM listings WHERE id = ?1", LISTING_COLUMNS),
            params![id],
            listing_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Turns unique/check failures into `ConstraintViolation`
fn constraint_error(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, message)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation(message.clone().unwrap_or_else(|| err.to_string()))
        }
        _ => StoreError::Sqlite(e),
    }
}

impl Store for SqliteStore {
    fn find_existing(&self, links: &[String]) -> StoreResult<HashSet<String>> {
        let mut existing = HashSet::new();
        if links.is_empty() {
            return Ok(existing);
        }

        let conn = self.lock()?;
        for chunk in links.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT link FROM listings WHERE link IN ({})",
                placeholders
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            for link in rows {
                existing.insert(link?);
            }
        }

        Ok(existing)
    }

    fn insert_ignoring_conflicts(&self, listings: &[Listing]) -> StoreResult<usize> {
        if listings.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO listings
                 (title, price, currency, year, mileage, location, link, raw_text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                 ON CONFLICT(link) DO NOTHING",
            )?;

            for listing in listings {
                match stmt.execute(params![
                    listing.title,
                    listing.price,
                    listing.currency,
                    listing.year,
                    listing.mileage,
                    listing.location,
                    listing.link,
                    listing.raw_text,
                    now,
                ]) {
                    Ok(rows) => inserted += rows,
                    Err(e) => {
                        tracing::warn!("Skipping listing {:?}: {}", listing.link, e);
                    }
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}

impl ListingRepository for SqliteStore {
    fn get_listing(&self, id: i64) -> StoreResult<Option<ListingRecord>> {
        let conn = self.lock()?;
        fetch_listing(&conn, id)
    }

    fn list_listings(&self, limit: usize) -> StoreResult<Vec<ListingRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM listings ORDER BY created_at DESC, id DESC LIMIT ?1",
            LISTING_COLUMNS
        ))?;

        let listings = stmt
            .query_map(params![limit as i64], listing_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(listings)
    }

    fn create_listing(&self, listing: &Listing) -> StoreResult<ListingRecord> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO listings
             (title, price, currency, year, mileage, location, link, raw_text, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                listing.title,
                listing.price,
                listing.currency,
                listing.year,
                listing.mileage,
                listing.location,
                listing.link,
                listing.raw_text,
                now,
            ],
        )
        .map_err(constraint_error)?;

        let id = conn.last_insert_rowid();
        fetch_listing(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    fn update_listing(&self, id: i64, listing: &Listing) -> StoreResult<ListingRecord> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let updated = conn
            .execute(
                "UPDATE listings
                 SET title = ?1, price = ?2, currency = ?3, year = ?4, mileage = ?5,
                     location = ?6, link = ?7, raw_text = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    listing.title,
                    listing.price,
                    listing.currency,
                    listing.year,
                    listing.mileage,
                    listing.location,
                    listing.link,
                    listing.raw_text,
                    now,
                    id,
                ],
            )
            .map_err(constraint_error)?;

        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }

        fetch_listing(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    fn delete_listing(&self, id: i64) -> StoreResult<()> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM listings WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn count_listings(&self) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_currency(&self) -> StoreResult<Vec<(Option<String>, u64)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT currency, COUNT(*) AS count FROM listings
             GROUP BY currency ORDER BY count DESC, currency",
        )?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}

impl SessionLog for SqliteStore {
    fn begin_session(&self, config_hash: &str) -> StoreResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO harvest_sessions (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, SessionStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn finish_session(
        &self,
        session_id: i64,
        status: SessionStatus,
        totals: &SessionTotals,
        error_message: Option<&str>,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let updated = conn.execute(
            "UPDATE harvest_sessions
             SET finished_at = ?1, status = ?2, cycles = ?3, discovered = ?4, inserted = ?5,
                 error_message = ?6
             WHERE id = ?7",
            params![
                now,
                status.to_db_string(),
                totals.cycles,
                totals.discovered as i64,
                totals.inserted as i64,
                error_message,
                session_id,
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::Database(format!(
                "Harvest session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<HarvestSessionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM harvest_sessions ORDER BY id DESC LIMIT ?1",
            SESSION_COLUMNS
        ))?;

        let sessions = stmt
            .query_map(params![limit as i64], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }
}
