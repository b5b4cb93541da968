//! Output module for reporting harvest results
//!
//! This module handles:
//! - Summarizing a finished harvest session
//! - Mapping a session outcome to its stored status and counters
//! - Displaying store statistics and stored listings

pub mod stats;
mod summary;

pub use stats::{
    load_statistics, print_listings, print_statistics, render_listings, render_statistics,
    StoreStatistics,
};
pub use summary::{print_summary, render_summary, session_status, session_totals};
