//! Remote skill marketplace client.
//!
//! Fetches the paginated all-time listing and keyword search results, and
//! normalizes the loosely specified response payloads into
//! [`MarketplaceRecord`]s.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use {
    client::{HttpMarketplaceClient, MarketplaceClient},
    error::{Error, Result},
    normalize::normalize_records,
    types::{MarketplaceRecord, PAGE_SIZE, dedup_by_id, is_last_page},
};
