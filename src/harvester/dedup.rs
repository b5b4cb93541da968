//! In-session deduplication and batch streaming
//!
//! Every cycle re-extracts the whole rendered feed, so most of what comes back
//! has been seen before. This module keeps only first sightings and hands them
//! to the ingestion side one batch at a time.

use crate::extract::Listing;
use crate::state::SessionState;
use crate::HarvestError;
use tokio::sync::mpsc;

/// Batches buffered between producer and consumer
///
/// With a single slot a publish cannot complete until the previous batch has
/// been taken by the consumer.
pub const BATCH_CHANNEL_CAPACITY: usize = 1;

/// Keeps the listings not yet seen this session, in extraction order
///
/// Listings without an identity key are dropped without being counted. Repeat
/// sightings, including repeats within `extracted` itself, are counted into
/// `total_duplicates_this_cycle`.
pub fn filter_new(extracted: Vec<Listing>, state: &mut SessionState) -> Vec<Listing> {
    let mut fresh = Vec::new();
    let mut duplicates = 0;

    for listing in extracted {
        if !listing.has_identity() {
            continue;
        }
        if !state.mark_seen(&listing.link) {
            duplicates += 1;
            continue;
        }
        fresh.push(listing);
    }

    state.total_duplicates_this_cycle = duplicates;
    state.total_discovered += fresh.len() as u64;
    state.new_since_last_progress += fresh.len() as u64;

    fresh
}

/// Producer half of the batch channel
pub struct BatchPublisher {
    tx: mpsc::Sender<Vec<Listing>>,
}

/// Creates the bounded channel between the cycle loop and the ingestion consumer
pub fn batch_channel() -> (BatchPublisher, mpsc::Receiver<Vec<Listing>>) {
    let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
    (BatchPublisher { tx }, rx)
}

impl BatchPublisher {
    /// Publishes a batch, waiting for room in the channel
    ///
    /// Empty batches are never sent.
    pub async fn publish(&self, batch: Vec<Listing>) -> Result<(), HarvestError> {
        if batch.is_empty() {
            return Ok(());
        }

        let size = batch.len();
        self.tx.send(batch).await.map_err(|_| {
            tracing::error!("Ingestion consumer is gone, dropping batch of {}", size);
            HarvestError::ConsumerClosed
        })?;

        tracing::debug!("Published batch of {} listings", size);
        Ok(())
    }
}
