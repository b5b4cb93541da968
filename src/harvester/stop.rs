//! Exhaustion detection
//!
//! No single signal reliably says the feed has run dry: a slow network looks
//! like an empty cycle, a virtualized list can keep the element count flat, and
//! the scroll position can stall while content is still loading. A session is
//! considered exhausted only when enough independent signals agree.

use crate::config::HarvestConfig;
use crate::state::{PageSnapshot, SessionState};
use std::fmt;

/// An individually-unreliable exhaustion indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftSignal {
    /// Cycles in a row without a newly-seen listing
    NoNewItems,
    /// Cycles in a row where the matched element count did not change
    UnchangedDom,
    /// Cycles in a row where the scroll offset did not move
    ScrollStuck,
}

impl fmt::Display for SoftSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoNewItems => "no new items",
            Self::UnchangedDom => "unchanged item count",
            Self::ScrollStuck => "scroll stuck",
        };
        f.write_str(name)
    }
}

/// Why a session stopped cycling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    MaxCycles,
    MaxDuration,
    Exhausted { signals: Vec<SoftSignal> },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxCycles => f.write_str("cycle limit reached"),
            Self::MaxDuration => f.write_str("session duration limit reached"),
            Self::Exhausted { signals } => {
                let names: Vec<String> = signals.iter().map(|s| s.to_string()).collect();
                write!(f, "feed exhausted ({})", names.join(", "))
            }
        }
    }
}

/// Updates the DOM and scroll signals from the snapshots taken around one scroll
///
/// A signal only counts when its pre-scroll value is non-zero, so an empty
/// page or one sitting at the very top does not look stuck.
pub fn update_scroll_signals(state: &mut SessionState, before: &PageSnapshot, after: &PageSnapshot) {
    if before.item_count > 0 && before.item_count == after.item_count {
        state.consecutive_unchanged_dom_count = state.consecutive_unchanged_dom_count.saturating_add(1);
    } else {
        state.consecutive_unchanged_dom_count = 0;
    }

    if before.scroll_offset > 0 && before.scroll_offset == after.scroll_offset {
        state.consecutive_no_scroll_movement = state.consecutive_no_scroll_movement.saturating_add(1);
    } else {
        state.consecutive_no_scroll_movement = 0;
    }

    state.previous_dom_count = after.item_count;
    state.previous_scroll_offset = after.scroll_offset;
}

/// Updates the no-new-items signal with this cycle's yield
pub fn record_yield(state: &mut SessionState, new_items: usize) {
    if new_items == 0 {
        state.consecutive_no_new_items = state.consecutive_no_new_items.saturating_add(1);
    } else {
        state.consecutive_no_new_items = 0;
    }
}

/// Soft signals currently at or over their thresholds
pub fn tripped_signals(state: &SessionState, config: &HarvestConfig) -> Vec<SoftSignal> {
    let mut signals = Vec::with_capacity(3);
    if state.consecutive_no_new_items >= config.max_consecutive_no_new {
        signals.push(SoftSignal::NoNewItems);
    }
    if state.consecutive_unchanged_dom_count >= config.max_consecutive_unchanged_dom {
        signals.push(SoftSignal::UnchangedDom);
    }
    if state.consecutive_no_scroll_movement >= config.max_consecutive_scroll_stuck {
        signals.push(SoftSignal::ScrollStuck);
    }
    signals
}

/// Decides whether the session should stop before running another cycle
///
/// Hard limits are checked first. Otherwise the session halts once
/// `required_soft_signals` soft signals have tripped together.
pub fn should_stop(state: &SessionState, config: &HarvestConfig) -> Option<StopReason> {
    if state.cycle_count >= config.max_cycles {
        return Some(StopReason::MaxCycles);
    }

    if state.elapsed() >= config.max_session_duration() {
        return Some(StopReason::MaxDuration);
    }

    let signals = tripped_signals(state, config);
    if signals.len() as u32 >= config.required_soft_signals {
        return Some(StopReason::Exhausted { signals });
    }

    None
}
