//! Listing extraction
//!
//! Extraction is split in two. A small script runs in the page and returns one
//! `{href, text}` shape per element matching the item selector; everything
//! after that (line classification, currency and year detection, link
//! canonicalization) happens here in Rust.

mod classify;
mod script;

pub use classify::{classify_lines, detect_currency, detect_year, ClassifiedLines};
pub use script::PageScripts;

use crate::driver::{evaluate_as, DriverResult, PageDriver};
use crate::state::PageSnapshot;
use crate::url::canonical_link;
use serde::{Deserialize, Serialize};

/// A listing as harvested from the page
///
/// `link` is the identity key: two listings with the same link are the same
/// item, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub price: String,
    pub currency: Option<String>,
    pub year: Option<String>,
    pub mileage: String,
    pub location: String,
    /// Canonical link; empty when the element's href could not be canonicalized
    pub link: String,
    pub raw_text: String,
}

/// The shape the extraction script returns for each matched element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub text: String,
}

impl Listing {
    /// Builds a listing from a raw element shape
    pub fn from_raw(raw: &RawListing) -> Self {
        let lines = classify_lines(&raw.text);
        let link = match canonical_link(&raw.href) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!("Unusable listing href {:?}: {}", raw.href, e);
                String::new()
            }
        };

        Self {
            currency: detect_currency(&lines.price),
            year: detect_year(&lines.title),
            title: lines.title,
            price: lines.price,
            mileage: lines.mileage,
            location: lines.location,
            link,
            raw_text: raw.text.clone(),
        }
    }

    /// Returns true if the listing has a usable identity key
    pub fn has_identity(&self) -> bool {
        !self.link.is_empty()
    }
}

/// Reads the page's item count, scroll offset and viewport height
pub async fn probe_page<D>(driver: &D, scripts: &PageScripts) -> DriverResult<PageSnapshot>
where
    D: PageDriver + ?Sized,
{
    evaluate_as(driver, &scripts.probe, "page probe").await
}

/// Extracts every currently rendered listing, in document order
pub async fn extract_listings<D>(driver: &D, scripts: &PageScripts) -> DriverResult<Vec<Listing>>
where
    D: PageDriver + ?Sized,
{
    let raw: Vec<RawListing> = evaluate_as(driver, &scripts.extract, "listing extraction").await?;
    Ok(raw.iter().map(Listing::from_raw).collect())
}
