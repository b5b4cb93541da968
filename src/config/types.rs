use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Item selector used by the default target (marketplace listing anchors)
pub const DEFAULT_ITEM_SELECTOR: &str = "a[href*='/marketplace/item/']";

/// Main configuration structure for Listing Harvester
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub target: TargetConfig,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

/// Harvest loop tuning
///
/// Loaded once per process and never mutated by a running session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct HarvestConfig {
    /// Hard cap on scroll cycles per session
    pub max_cycles: u32,

    /// Hard cap on session wall-clock time (seconds)
    pub max_session_duration_secs: u64,

    /// Delay used for the first cycle (milliseconds)
    pub initial_delay_ms: u64,

    /// Lower bound for the adaptive delay (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound for the adaptive delay (milliseconds)
    pub max_delay_ms: u64,

    /// Wait after the initial navigation before the first cycle (milliseconds)
    pub settle_delay_ms: u64,

    /// Consecutive cycles without new listings before that signal trips
    pub max_consecutive_no_new: u32,

    /// Consecutive cycles with an unchanged item count before that signal trips
    pub max_consecutive_unchanged_dom: u32,

    /// Consecutive cycles without scroll movement before that signal trips
    pub max_consecutive_scroll_stuck: u32,

    /// How many soft signals must trip together to end the session
    pub required_soft_signals: u32,

    /// Emit a progress line every N cycles
    pub progress_log_interval: u32,

    /// New listings per cycle above which the delay shrinks
    pub high_yield_threshold: usize,

    /// Delay decrease on a high-yield cycle (milliseconds)
    pub speed_up_step_ms: u64,

    /// Delay increase on a cycle with no new listings (milliseconds)
    pub no_yield_step_ms: u64,

    /// Duplicate share of a cycle's extraction above which the delay grows
    pub duplicate_ratio_threshold: f64,

    /// Delay increase on a duplicate-heavy cycle (milliseconds)
    pub duplicate_step_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_cycles: 2000,
            max_session_duration_secs: 60 * 60,
            initial_delay_ms: 2000,
            min_delay_ms: 1500,
            max_delay_ms: 5000,
            settle_delay_ms: 5000,
            max_consecutive_no_new: 10,
            max_consecutive_unchanged_dom: 10,
            max_consecutive_scroll_stuck: 10,
            required_soft_signals: 2,
            progress_log_interval: 5,
            high_yield_threshold: 20,
            speed_up_step_ms: 100,
            no_yield_step_ms: 500,
            duplicate_ratio_threshold: 0.5,
            duplicate_step_ms: 200,
        }
    }
}

impl HarvestConfig {
    pub fn max_session_duration(&self) -> Duration {
        Duration::from_secs(self.max_session_duration_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn speed_up_step(&self) -> Duration {
        Duration::from_millis(self.speed_up_step_ms)
    }

    pub fn no_yield_step(&self) -> Duration {
        Duration::from_millis(self.no_yield_step_ms)
    }

    pub fn duplicate_step(&self) -> Duration {
        Duration::from_millis(self.duplicate_step_ms)
    }
}

/// What to harvest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetConfig {
    /// Listing page to open before scrolling
    pub url: String,

    /// CSS selector matching one element per listing card
    pub item_selector: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            item_selector: DEFAULT_ITEM_SELECTOR.to_string(),
        }
    }
}

/// Browser session settings used by the CLI driver
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run Chrome without a window
    pub headless: bool,

    /// Chrome profile directory; reusing a logged-in profile keeps the session authenticated
    pub user_data_dir: Option<String>,

    /// DevTools websocket of an already running browser to attach to instead of launching
    pub connect_url: Option<String>,

    /// User agent override for launched browsers
    pub user_agent: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "listings.db".to_string(),
        }
    }
}
