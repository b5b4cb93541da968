//! Configuration module for Listing Harvester
//!
//! This module handles loading, layering, and validating configuration. Every
//! field has a default; an optional TOML file and environment variables are
//! applied on top.
//!
//! # Example
//!
//! ```no_run
//! use listing_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("harvester.toml"))).unwrap();
//! println!("Harvester will scroll at most {} times", config.harvest.max_cycles);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, HarvestConfig, OutputConfig, TargetConfig, DEFAULT_ITEM_SELECTOR,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_env, load_config_with_hash,
    parse_duration,
};
pub use validation::{validate, validate_harvest_config, validate_target_config};
