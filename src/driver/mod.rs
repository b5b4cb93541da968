//! Page driver capability
//!
//! The harvester never talks to a browser directly. It is handed something that
//! implements [`PageDriver`]: an already-authenticated, navigable page that can
//! run scripts, scroll, and wait. How that session was obtained (login,
//! cookies, a reused profile) is the host's business.
//!
//! With the `browser` feature enabled, [`ChromiumDriver`] provides a Chrome
//! DevTools implementation.

#[cfg(feature = "browser")]
mod chromium;

#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page driver
///
/// Every variant is fatal to the harvest session that observes it.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Scroll failed: {0}")]
    Scroll(String),

    #[error("Unexpected value returned for {what}: {source}")]
    UnexpectedValue {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("Failed to start browser session: {0}")]
    Launch(String),
}

/// Result type for page driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// A navigable, script-capable browsing session
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Loads `url` in the page
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// Evaluates a JavaScript expression and returns its JSON value
    async fn evaluate(&self, script: &str) -> DriverResult<Value>;

    /// Scrolls the page vertically by `delta` CSS pixels
    async fn scroll_by(&self, delta: i64) -> DriverResult<()>;

    /// Suspends the caller for `duration`
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Evaluates a script and deserializes its result
pub async fn evaluate_as<T, D>(driver: &D, script: &str, what: &'static str) -> DriverResult<T>
where
    T: serde::de::DeserializeOwned,
    D: PageDriver + ?Sized,
{
    let value = driver.evaluate(script).await?;
    serde_json::from_value(value).map_err(|source| DriverError::UnexpectedValue { what, source })
}
