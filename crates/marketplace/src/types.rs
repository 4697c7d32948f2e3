use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Fixed page size of the all-time listing.
pub const PAGE_SIZE: usize = 50;

/// A remote listing. `id` is the sole identity used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceRecord {
    pub id: String,
    pub skill_id: String,
    pub name: String,
    pub install_count: u64,
    /// Owning repository, e.g. `acme/tools`.
    pub source: String,
}

impl MarketplaceRecord {
    /// Synthetic identity used when the payload carries no `id`.
    pub fn synthetic_id(source: &str, skill_id: &str) -> String {
        format!("{source}/{skill_id}")
    }
}

/// A fetched page with fewer than [`PAGE_SIZE`] records is the last one.
#[must_use]
pub fn is_last_page(len: usize) -> bool {
    len < PAGE_SIZE
}

/// Drop later duplicates of any `id`, preserving first-occurrence order.
pub fn dedup_by_id(records: Vec<MarketplaceRecord>) -> Vec<MarketplaceRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}
