//! Ingestion consumer
//!
//! Drains published batches into the store. The store is checked for links it
//! already holds before anything is written, so listings harvested by an
//! earlier session are never inserted twice. A batch whose lookup or
//! transaction fails is skipped and the consumer moves on.

use crate::extract::Listing;
use crate::storage::Store;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Counters kept by the ingestion consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Batches taken off the channel
    pub batches_received: u64,
    /// Batches dropped because the lookup or the transaction failed
    pub batches_skipped: u64,
    /// Listings the store already held
    pub already_stored: u64,
    /// Rows inserted
    pub inserted: u64,
}

pub struct IngestConsumer<S: Store + ?Sized> {
    store: Arc<S>,
    report: IngestReport,
}

impl<S: Store + ?Sized> IngestConsumer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            report: IngestReport::default(),
        }
    }

    /// Consumes batches until every sender is dropped
    pub async fn drain(mut self, mut batches: mpsc::Receiver<Vec<Listing>>) -> IngestReport {
        while let Some(batch) = batches.recv().await {
            self.ingest_batch(batch);
        }
        self.report
    }

    /// Persists one batch, skipping listings the store already holds
    pub fn ingest_batch(&mut self, batch: Vec<Listing>) {
        self.report.batches_received += 1;
        let received = batch.len();

        let links: Vec<String> = batch.iter().map(|l| l.link.clone()).collect();
        let existing = match self.store.find_existing(&links) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!("Skipping batch of {}: existing-link lookup failed: {}", received, e);
                self.report.batches_skipped += 1;
                return;
            }
        };

        let remaining: Vec<Listing> = batch
            .into_iter()
            .filter(|l| !existing.contains(&l.link))
            .collect();
        self.report.already_stored += (received - remaining.len()) as u64;

        if remaining.is_empty() {
            tracing::debug!("All {} listings in batch already stored", received);
            return;
        }

        match self.store.insert_ignoring_conflicts(&remaining) {
            Ok(inserted) => {
                self.report.inserted += inserted as u64;
                tracing::debug!(
                    "Inserted {} of {} listings (running total {})",
                    inserted,
                    remaining.len(),
                    self.report.inserted
                );
            }
            Err(e) => {
                tracing::warn!("Skipping batch of {}: insert failed: {}", remaining.len(), e);
                self.report.batches_skipped += 1;
            }
        }
    }

    pub fn report(&self) -> IngestReport {
        self.report
    }
}
