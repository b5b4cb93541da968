//! Listing Harvester: an incremental infinite-scroll harvesting engine
//!
//! This crate drives an already-authenticated browsing session through an
//! infinitely-scrolling listing page, extracts structured listings, adapts its
//! scroll pace to the page's loading rate, detects exhaustion, and streams
//! newly-discovered listings into a durable store that performs its own
//! deduplication pass before committing them.

pub mod config;
pub mod driver;
pub mod extract;
pub mod harvester;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Harvest producer stopped without reporting a status")]
    ProducerAborted,

    #[error("Ingestion consumer stopped before the harvest finished")]
    ConsumerClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, HarvestConfig};
pub use driver::PageDriver;
pub use extract::Listing;
pub use harvester::{HarvestOutcome, HarvestSession};
pub use state::SessionState;
pub use storage::{SqliteStore, Store};
pub use url::canonical_link;
