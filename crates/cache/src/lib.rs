//! Persisted key-value cache with freshness timestamps.
//!
//! The store itself never expires anything: callers compare
//! [`CacheEntry::timestamp_ms`] against their own TTL via [`is_fresh`]. Values
//! are wrapped in a [`Versioned`] envelope so a schema change turns old data
//! into a cache miss instead of a misread.

pub mod error;
pub mod file;
pub mod ids;
pub mod memory;
pub mod store;
pub mod versioned;

pub use {
    error::{Error, Result},
    file::JsonFileCacheStore,
    ids::MarketplaceIdMap,
    memory::MemoryCacheStore,
    store::{CacheEntry, CacheStore, is_fresh, now_ms},
    versioned::{Versioned, load_versioned, store_versioned},
};

/// Cache key of the installed-skill snapshot.
pub const INSTALLED_KEY: &str = "installed-skills";
pub const INSTALLED_VERSION: u32 = 1;

/// Cache key of the marketplace browse snapshot. Bump the version whenever the
/// page numbering convention changes.
pub const BROWSE_KEY: &str = "marketplace-browse";
pub const BROWSE_VERSION: u32 = 2;

/// Cache key of the skill-name to marketplace-id mapping.
pub const MARKETPLACE_IDS_KEY: &str = "marketplace-ids";
pub const MARKETPLACE_IDS_VERSION: u32 = 1;
