use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A point-in-time reading of the page taken around each scroll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    /// Number of elements matching the item selector
    pub item_count: u64,

    /// Vertical scroll offset in CSS pixels
    pub scroll_offset: i64,

    /// Viewport height in CSS pixels
    pub viewport_height: i64,
}

/// Mutable state of one harvest session
///
/// Owned by the producer task for the whole session and handed to each
/// component by `&mut`; never shared between sessions.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Cycles completed so far
    pub cycle_count: u32,

    /// Consecutive cycles that yielded no newly-seen listing
    pub consecutive_no_new_items: u32,

    /// Consecutive cycles whose item count did not change across the scroll
    pub consecutive_unchanged_dom_count: u32,

    /// Consecutive cycles whose scroll offset did not change across the scroll
    pub consecutive_no_scroll_movement: u32,

    /// Item count read after the most recent scroll
    pub previous_dom_count: u64,

    /// Scroll offset read after the most recent scroll
    pub previous_scroll_offset: i64,

    /// Wait applied after the next scroll
    pub current_delay: Duration,

    /// Canonical links seen this session; only ever grows
    pub seen_links: HashSet<String>,

    /// Unique listings discovered this session
    pub total_discovered: u64,

    /// Duplicates found by the most recent cycle
    pub total_duplicates_this_cycle: usize,

    /// New listings since the last progress line
    pub new_since_last_progress: u64,

    /// When the session started
    pub started_at: Instant,
}

impl SessionState {
    /// Creates the state for a fresh session starting now
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            cycle_count: 0,
            consecutive_no_new_items: 0,
            consecutive_unchanged_dom_count: 0,
            consecutive_no_scroll_movement: 0,
            previous_dom_count: 0,
            previous_scroll_offset: 0,
            current_delay: initial_delay,
            seen_links: HashSet::with_capacity(10_000),
            total_discovered: 0,
            total_duplicates_this_cycle: 0,
            new_since_last_progress: 0,
            started_at: Instant::now(),
        }
    }

    /// Time since the session started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Number of distinct links seen this session
    pub fn unique_seen(&self) -> usize {
        self.seen_links.len()
    }

    /// Returns true if the link has already been seen this session
    pub fn has_seen(&self, link: &str) -> bool {
        self.seen_links.contains(link)
    }

    /// Records a link, returning false if it was already present
    pub fn mark_seen(&mut self, link: &str) -> bool {
        if self.seen_links.contains(link) {
            return false;
        }
        self.seen_links.insert(link.to_string())
    }
}
