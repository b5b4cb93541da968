//! Chrome DevTools page driver
//!
//! Launches Chrome (or attaches to one that is already running) through
//! chromiumoxide and exposes a single page as a [`PageDriver`].

use super::{DriverError, DriverResult, PageDriver};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Chrome-backed page driver
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    attached: bool,
}

impl ChromiumDriver {
    /// Builds a driver from configuration
    ///
    /// Attaches to `connect_url` when set, otherwise launches a new browser.
    pub async fn from_config(config: &BrowserConfig) -> DriverResult<Self> {
        match &config.connect_url {
            Some(ws) => Self::connect(ws).await,
            None => Self::launch(config).await,
        }
    }

    /// Launches a new Chrome process
    ///
    /// Pointing `user_data_dir` at a profile that is already logged in gives an
    /// authenticated session without any login step here.
    pub async fn launch(config: &BrowserConfig) -> DriverResult<Self> {
        let mut builder = CdpBrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.arg(format!("--user-agent={}", agent));
        }
        let cdp_config = builder.build().map_err(DriverError::Launch)?;

        let (browser, handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        let handler = spawn_handler(handler);

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        info!("Launched browser (headless: {})", config.headless);

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            attached: false,
        })
    }

    /// Attaches to a running browser through its DevTools websocket
    ///
    /// Reuses the first open tab, or opens one if there is none.
    pub async fn connect(ws_url: &str) -> DriverResult<Self> {
        let (browser, handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| DriverError::Launch(format!("{}: {}", ws_url, e)))?;
        let handler = spawn_handler(handler);

        let existing = browser
            .pages()
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        let page = match existing.into_iter().next() {
            Some(page) => page,
            None => browser
                .new_page("about:blank")
                .await
                .map_err(|e| DriverError::Launch(e.to_string()))?,
        };

        info!("Attached to browser at {}", ws_url);

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            attached: true,
        })
    }

    /// Shuts the browser down
    ///
    /// A browser this driver attached to is left running.
    pub async fn close(self) {
        if !self.attached {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
        }
        self.handler.abort();
    }
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("Browser handler stopped: {}", e);
                break;
            }
        }
    })
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> DriverResult<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn scroll_by(&self, delta: i64) -> DriverResult<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", delta))
            .await
            .map_err(|e| DriverError::Scroll(e.to_string()))?;
        Ok(())
    }
}
