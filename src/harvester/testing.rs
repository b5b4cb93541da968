//! A simulated infinite-scroll page for harvester tests

use crate::config::DEFAULT_ITEM_SELECTOR;
use crate::driver::{DriverError, DriverResult, PageDriver};
use crate::extract::PageScripts;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

const VIEWPORT_HEIGHT: i64 = 900;

struct PageInner {
    total: usize,
    rendered: usize,
    per_scroll: usize,
    offset: i64,
    scrolls: usize,
    fail_at_scroll: Option<usize>,
    navigations: Vec<String>,
}

/// A feed that renders `per_scroll` more cards on every scroll until `total`
/// are on screen, after which neither the count nor the offset changes
pub struct FakePage {
    scripts: PageScripts,
    inner: Mutex<PageInner>,
}

impl FakePage {
    pub fn new(total: usize, initial: usize, per_scroll: usize) -> Self {
        Self {
            scripts: PageScripts::new(DEFAULT_ITEM_SELECTOR),
            inner: Mutex::new(PageInner {
                total,
                rendered: initial.min(total),
                per_scroll,
                offset: 0,
                scrolls: 0,
                fail_at_scroll: None,
                navigations: Vec::new(),
            }),
        }
    }

    /// Makes the nth scroll (1-based) fail
    pub fn failing_at_scroll(self, n: usize) -> Self {
        self.inner.lock().unwrap().fail_at_scroll = Some(n);
        self
    }

    pub fn scrolls(&self) -> usize {
        self.inner.lock().unwrap().scrolls
    }

    pub fn navigations(&self) -> Vec<String> {
        self.inner.lock().unwrap().navigations.clone()
    }

    pub fn card_href(i: usize) -> String {
        format!("https://www.example.com/marketplace/item/{}/?ref=feed", 1000 + i)
    }

    fn card(i: usize) -> Value {
        json!({
            "href": Self::card_href(i),
            "text": format!("₱{},000\nToyota Vios 20{:02}\nQuezon City\n{}K km", 300 + i, i % 25, i),
        })
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.inner.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> DriverResult<Value> {
        let inner = self.inner.lock().unwrap();
        if script == self.scripts.probe {
            Ok(json!({
                "itemCount": inner.rendered,
                "scrollOffset": inner.offset,
                "viewportHeight": VIEWPORT_HEIGHT,
            }))
        } else if script == self.scripts.extract {
            Ok(Value::Array((0..inner.rendered).map(Self::card).collect()))
        } else {
            Err(DriverError::Evaluation("unknown script".to_string()))
        }
    }

    async fn scroll_by(&self, delta: i64) -> DriverResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.scrolls += 1;
        if inner.fail_at_scroll == Some(inner.scrolls) {
            return Err(DriverError::Scroll("target closed".to_string()));
        }

        if inner.rendered < inner.total {
            inner.rendered = (inner.rendered + inner.per_scroll).min(inner.total);
            inner.offset += delta;
        }
        Ok(())
    }
}
