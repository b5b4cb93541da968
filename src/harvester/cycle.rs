//! One scroll-wait-extract iteration

use crate::config::HarvestConfig;
use crate::driver::PageDriver;
use crate::extract::{extract_listings, probe_page, PageScripts};
use crate::harvester::dedup::{filter_new, BatchPublisher};
use crate::harvester::delay::next_delay;
use crate::harvester::stop::{record_yield, update_scroll_signals};
use crate::state::SessionState;
use crate::HarvestError;

/// What a single cycle observed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Listings extracted from the rendered page
    pub extracted: usize,
    /// Listings seen for the first time this session
    pub new_items: usize,
    /// Repeat sightings
    pub duplicates: usize,
}

/// Runs one cycle against the page
///
/// Probes the page, scrolls one viewport, waits the current delay, probes
/// again, extracts every rendered listing, publishes the first sightings as a
/// batch and adapts the delay. Any driver failure is returned as-is; the
/// caller treats it as fatal to the session.
pub async fn run_cycle<D>(
    driver: &D,
    state: &mut SessionState,
    config: &HarvestConfig,
    scripts: &PageScripts,
    publisher: &BatchPublisher,
) -> Result<CycleReport, HarvestError>
where
    D: PageDriver + ?Sized,
{
    let before = probe_page(driver, scripts).await?;
    driver.scroll_by(before.viewport_height).await?;
    driver.sleep(state.current_delay).await;
    let after = probe_page(driver, scripts).await?;

    update_scroll_signals(state, &before, &after);

    let extracted = extract_listings(driver, scripts).await?;
    let total = extracted.len();
    let fresh = filter_new(extracted, state);

    let report = CycleReport {
        extracted: total,
        new_items: fresh.len(),
        duplicates: state.total_duplicates_this_cycle,
    };

    record_yield(state, report.new_items);
    publisher.publish(fresh).await?;

    state.current_delay = next_delay(
        state.current_delay,
        report.new_items,
        report.duplicates,
        report.extracted,
        config,
    );
    state.cycle_count += 1;

    tracing::debug!(
        "Cycle {}: {} extracted, {} new, {} duplicates, items {} -> {}, next delay {:?}",
        state.cycle_count,
        report.extracted,
        report.new_items,
        report.duplicates,
        before.item_count,
        after.item_count,
        state.current_delay
    );

    if config.progress_log_interval > 0 && state.cycle_count % config.progress_log_interval == 0 {
        tracing::info!(
            "Progress: cycle {}, {} new since last report, {} discovered, delay {:?}, elapsed {:?}",
            state.cycle_count,
            state.new_since_last_progress,
            state.total_discovered,
            state.current_delay,
            state.elapsed()
        );
        state.new_since_last_progress = 0;
    }

    Ok(report)
}
