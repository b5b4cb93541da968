//! Harvester module: the scroll-extract-persist pipeline
//!
//! This module contains the core harvesting logic, including:
//! - The per-cycle scroll, wait and extract step
//! - Exhaustion detection from corroborating soft signals
//! - Adaptive pacing of the scroll delay
//! - In-session deduplication and bounded batch streaming
//! - The ingestion consumer that persists batches
//! - Session orchestration of the producer and consumer tasks

mod cycle;
mod dedup;
mod delay;
mod ingest;
mod session;
mod stop;

#[cfg(test)]
pub(crate) mod testing;

pub use cycle::{run_cycle, CycleReport};
pub use dedup::{batch_channel, filter_new, BatchPublisher, BATCH_CHANNEL_CAPACITY};
pub use delay::next_delay;
pub use ingest::{IngestConsumer, IngestReport};
pub use session::{HarvestOutcome, HarvestSession, SessionReport};
pub use stop::{record_yield, should_stop, tripped_signals, update_scroll_signals, SoftSignal, StopReason};

use crate::config::Config;
use crate::driver::PageDriver;
use crate::storage::Store;
use std::sync::Arc;

/// Runs a complete harvest session
///
/// This is the main entry point for a harvest. It will:
/// 1. Validate the harvest and target settings
/// 2. Open the target page and let it settle
/// 3. Cycle until a stop condition holds or the driver fails
/// 4. Persist every new listing through the store
///
/// # Arguments
///
/// * `driver` - An authenticated page session
/// * `store` - Where listings are persisted
/// * `config` - The harvester configuration
///
/// # Returns
///
/// The number of inserted rows together with any fatal error
pub async fn harvest<D, S>(driver: Arc<D>, store: Arc<S>, config: &Config) -> HarvestOutcome
where
    D: PageDriver + 'static,
    S: Store + 'static,
{
    HarvestSession::new(driver, store, config.harvest.clone(), config.target.clone())
        .run()
        .await
}
