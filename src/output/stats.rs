//! Statistics generation from the listings database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{HarvestSessionRecord, ListingRecord, ListingRepository, SessionLog, StoreResult};
use std::fmt::Write;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored listings
    pub total_listings: u64,

    /// Listing counts per detected currency, largest first
    pub by_currency: Vec<(Option<String>, u64)>,

    /// Most recent harvest sessions, newest first
    pub recent_sessions: Vec<HarvestSessionRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
/// * `sessions` - How many recent sessions to include
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StoreError)` - Failed to query statistics
pub fn load_statistics<S>(store: &S, sessions: usize) -> StoreResult<StoreStatistics>
where
    S: ListingRepository + SessionLog + ?Sized,
{
    Ok(StoreStatistics {
        total_listings: store.count_listings()?,
        by_currency: store.count_by_currency()?,
        recent_sessions: store.recent_sessions(sessions)?,
    })
}

/// Seconds between a session's start and finish, if it finished
pub fn session_duration_secs(session: &HarvestSessionRecord) -> Option<i64> {
    let started = session
        .started_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    let finished = session
        .finished_at
        .as_ref()?
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    Some((finished - started).num_seconds())
}

/// Renders statistics as plain text
pub fn render_statistics(stats: &StoreStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Listing Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total listings: {}", stats.total_listings);
    let _ = writeln!(out);

    if !stats.by_currency.is_empty() {
        let _ = writeln!(out, "Listings by Currency:");
        for (currency, count) in &stats.by_currency {
            let percentage = if stats.total_listings > 0 {
                (*count as f64 / stats.total_listings as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                currency.as_deref().unwrap_or("unknown"),
                count,
                percentage
            );
        }
        let _ = writeln!(out);
    }

    if !stats.recent_sessions.is_empty() {
        let _ = writeln!(out, "Recent Harvest Sessions:");
        for session in &stats.recent_sessions {
            let duration = session_duration_secs(session)
                .map(|secs| format!("{}s", secs))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "  #{} {} [{}] cycles={} discovered={} inserted={} duration={}",
                session.id,
                session.started_at,
                session.status.to_db_string(),
                session.cycles,
                session.discovered,
                session.inserted,
                duration
            );
            if let Some(message) = &session.error_message {
                let _ = writeln!(out, "      error: {}", message);
            }
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    print!("{}", render_statistics(stats));
}

/// Renders stored listings, one per line
pub fn render_listings(records: &[ListingRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let listing = &record.listing;
        let _ = writeln!(
            out,
            "#{:<6} {:<14} {:<40} {:<12} {:<24} {}",
            record.id,
            listing.price,
            listing.title,
            listing.mileage,
            listing.location,
            listing.link
        );
    }
    out
}

/// Prints stored listings to stdout
pub fn print_listings(records: &[ListingRecord]) {
    if records.is_empty() {
        println!("No listings stored yet.");
        return;
    }
    print!("{}", render_listings(records));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Listing;
    use crate::storage::{SessionStatus, SessionTotals, SqliteStore, Store};

    fn listing(id: u32, currency: Option<&str>) -> Listing {
        Listing {
            title: format!("Kia Picanto {}", id),
            price: "₱350,000".to_string(),
            currency: currency.map(str::to_string),
            year: None,
            mileage: "20K km".to_string(),
            location: "Cavite".to_string(),
            link: format!("https://example.com/marketplace/item/{}/", id),
            raw_text: String::new(),
        }
    }

    #[test]
    fn test_load_statistics() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_ignoring_conflicts(&[
                listing(1, Some("PHP")),
                listing(2, Some("PHP")),
                listing(3, Some("USD")),
            ])
            .unwrap();
        let id = store.begin_session("hash").unwrap();
        store
            .finish_session(
                id,
                SessionStatus::Completed,
                &SessionTotals {
                    cycles: 5,
                    discovered: 3,
                    inserted: 3,
                },
                None,
            )
            .unwrap();

        let stats = load_statistics(&store, 10).unwrap();
        assert_eq!(stats.total_listings, 3);
        assert_eq!(stats.by_currency[0], (Some("PHP".to_string()), 2));
        assert_eq!(stats.recent_sessions.len(), 1);

        let text = render_statistics(&stats);
        assert!(text.contains("Total listings: 3"));
        assert!(text.contains("PHP: 2 (66.7%)"));
        assert!(text.contains("[completed] cycles=5 discovered=3 inserted=3"));
    }

    #[test]
    fn test_render_empty_statistics() {
        let store = SqliteStore::open_in_memory().unwrap();
        let text = render_statistics(&load_statistics(&store, 10).unwrap());
        assert!(text.contains("Total listings: 0"));
        assert!(!text.contains("Recent Harvest Sessions"));
    }

    #[test]
    fn test_unknown_currency_label() {
        let stats = StoreStatistics {
            total_listings: 1,
            by_currency: vec![(None, 1)],
            recent_sessions: vec![],
        };
        assert!(render_statistics(&stats).contains("unknown: 1 (100.0%)"));
    }

    #[test]
    fn test_session_duration() {
        let session = HarvestSessionRecord {
            id: 1,
            started_at: "2026-03-01T10:00:00+00:00".to_string(),
            finished_at: Some("2026-03-01T10:12:30+00:00".to_string()),
            config_hash: String::new(),
            status: SessionStatus::Completed,
            cycles: 0,
            discovered: 0,
            inserted: 0,
            error_message: None,
        };
        assert_eq!(session_duration_secs(&session), Some(750));

        let running = HarvestSessionRecord {
            finished_at: None,
            ..session
        };
        assert_eq!(session_duration_secs(&running), None);
    }

    #[test]
    fn test_render_listings() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_listing(&listing(9, Some("PHP"))).unwrap();

        let text = render_listings(&store.list_listings(5).unwrap());
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Kia Picanto 9"));
        assert!(text.contains("https://example.com/marketplace/item/9/"));
    }
}
