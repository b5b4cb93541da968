//! URL handling module for Listing Harvester
//!
//! Listings are identified by their canonical link. This module turns the raw
//! `href` values pulled out of the page into that canonical form and checks
//! target URLs supplied through configuration.

mod normalize;

pub use normalize::{canonical_link, parse_target_url};
