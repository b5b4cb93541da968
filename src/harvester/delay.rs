use crate::config::HarvestConfig;
use std::time::Duration;

/// Computes the wait applied after the next scroll
///
/// Rules are tried in order and the first match wins:
///
/// 1. a high-yield cycle speeds up by `speed_up_step`
/// 2. an empty cycle slows down by `no_yield_step`
/// 3. a cycle dominated by duplicates slows down by `duplicate_step`
///
/// The result always lies within `[min_delay, max_delay]`.
pub fn next_delay(
    current: Duration,
    new_items: usize,
    duplicates: usize,
    total_extracted: usize,
    config: &HarvestConfig,
) -> Duration {
    let next = if new_items > config.high_yield_threshold {
        current.saturating_sub(config.speed_up_step())
    } else if new_items == 0 {
        current.saturating_add(config.no_yield_step())
    } else if total_extracted > 0
        && duplicates as f64 / total_extracted as f64 > config.duplicate_ratio_threshold
    {
        current.saturating_add(config.duplicate_step())
    } else {
        current
    };

    next.max(config.min_delay()).min(config.max_delay())
}
