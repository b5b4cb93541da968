//! Harvest session orchestration
//!
//! A session runs two tasks: a producer that owns the page and the session
//! state and cycles until a stop condition holds, and a consumer that writes
//! published batches to the store. When the producer finishes, for whatever
//! reason, it drops its end of the batch channel and then hands its terminal
//! status over a oneshot. The consumer only reads that status after the
//! channel has been fully drained, so every batch published before a failure
//! is still persisted.

use crate::config::{validate_harvest_config, validate_target_config, HarvestConfig, TargetConfig};
use crate::driver::PageDriver;
use crate::extract::PageScripts;
use crate::harvester::cycle::run_cycle;
use crate::harvester::dedup::{batch_channel, BatchPublisher};
use crate::harvester::ingest::{IngestConsumer, IngestReport};
use crate::harvester::stop::{should_stop, StopReason};
use crate::state::SessionState;
use crate::storage::Store;
use crate::HarvestError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// What the producer side of a session achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub cycles: u32,
    pub discovered: u64,
    /// `None` when the session ended with an error
    pub stop_reason: Option<StopReason>,
    pub elapsed: Duration,
}

/// Result of a harvest session
///
/// `inserted` is always meaningful, even when `error` is set: rows written
/// before a fatal error are kept.
#[derive(Debug)]
pub struct HarvestOutcome {
    pub inserted: u64,
    pub ingest: IngestReport,
    pub session: SessionReport,
    pub error: Option<HarvestError>,
}

impl HarvestOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Unique listings discovered per minute of session time
    pub fn items_per_minute(&self) -> f64 {
        let minutes = self.session.elapsed.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.session.discovered as f64 / minutes
        } else {
            0.0
        }
    }

    fn rejected(error: HarvestError) -> Self {
        Self {
            inserted: 0,
            ingest: IngestReport::default(),
            session: SessionReport::default(),
            error: Some(error),
        }
    }
}

/// A single harvest run against one target page
pub struct HarvestSession<D, S>
where
    D: PageDriver + 'static,
    S: Store + 'static,
{
    driver: Arc<D>,
    store: Arc<S>,
    config: HarvestConfig,
    target: TargetConfig,
}

impl<D, S> HarvestSession<D, S>
where
    D: PageDriver + 'static,
    S: Store + 'static,
{
    pub fn new(driver: Arc<D>, store: Arc<S>, config: HarvestConfig, target: TargetConfig) -> Self {
        Self {
            driver,
            store,
            config,
            target,
        }
    }

    /// Runs the session to completion
    ///
    /// Never returns early with an error: the outcome carries the insert
    /// count together with the fatal error, if any.
    pub async fn run(self) -> HarvestOutcome {
        if let Err(e) =
            validate_harvest_config(&self.config).and_then(|_| validate_target_config(&self.target))
        {
            tracing::error!("Refusing to start harvest: {}", e);
            return HarvestOutcome::rejected(e.into());
        }

        tracing::info!(
            "Starting harvest of {} (max {} cycles, max {:?})",
            self.target.url,
            self.config.max_cycles,
            self.config.max_session_duration()
        );

        let (publisher, batches) = batch_channel();
        let (status_tx, status_rx) = oneshot::channel();

        let producer = Producer {
            driver: self.driver,
            scripts: PageScripts::for_target(&self.target),
            target_url: self.target.url,
            config: self.config,
            publisher,
        };

        let producer_task = AbortOnDrop(tokio::spawn(async move {
            let status = producer.run().await;
            // The receiver only disappears if the caller's future was dropped.
            let _ = status_tx.send(status);
        }));

        let ingest = IngestConsumer::new(self.store).drain(batches).await;

        let (session, error) = match status_rx.await {
            Ok(status) => status,
            Err(_) => (SessionReport::default(), Some(HarvestError::ProducerAborted)),
        };
        drop(producer_task);

        let outcome = HarvestOutcome {
            inserted: ingest.inserted,
            ingest,
            session,
            error,
        };
        log_outcome(&outcome);
        outcome
    }
}

/// Aborts the producer task if the session future is dropped before it finishes
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The cycling half of a session
///
/// Owns the only `BatchPublisher`; consuming `self` in `run` closes the
/// channel when the producer finishes.
struct Producer<D: PageDriver + ?Sized> {
    driver: Arc<D>,
    scripts: PageScripts,
    target_url: String,
    config: HarvestConfig,
    publisher: BatchPublisher,
}

impl<D: PageDriver + ?Sized> Producer<D> {
    async fn run(self) -> (SessionReport, Option<HarvestError>) {
        let mut state = SessionState::new(self.config.initial_delay());
        let result = self.cycle_until_stopped(&mut state).await;

        let (stop_reason, error) = match result {
            Ok(reason) => (Some(reason), None),
            Err(e) => {
                tracing::error!("Harvest aborted after {} cycles: {}", state.cycle_count, e);
                (None, Some(e))
            }
        };

        let report = SessionReport {
            cycles: state.cycle_count,
            discovered: state.total_discovered,
            stop_reason,
            elapsed: state.elapsed(),
        };
        (report, error)
    }

    async fn cycle_until_stopped(&self, state: &mut SessionState) -> Result<StopReason, HarvestError> {
        self.driver.navigate(&self.target_url).await?;
        self.driver.sleep(self.config.settle_delay()).await;

        loop {
            if let Some(reason) = should_stop(state, &self.config) {
                tracing::info!("Stopping after {} cycles: {}", state.cycle_count, reason);
                return Ok(reason);
            }

            run_cycle(
                self.driver.as_ref(),
                state,
                &self.config,
                &self.scripts,
                &self.publisher,
            )
            .await?;
        }
    }
}

fn log_outcome(outcome: &HarvestOutcome) {
    let ingest = &outcome.ingest;
    tracing::info!(
        "Harvest finished: {} cycles, {} discovered, {} inserted in {:?} ({:.1} items/min)",
        outcome.session.cycles,
        outcome.session.discovered,
        outcome.inserted,
        outcome.session.elapsed,
        outcome.items_per_minute()
    );
    tracing::info!(
        "Ingestion: {} batches, {} skipped, {} already stored",
        ingest.batches_received,
        ingest.batches_skipped,
        ingest.already_stored
    );
}
