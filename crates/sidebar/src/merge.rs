//! Pagination merge for "load more".

use skilldeck_marketplace::{MarketplaceRecord, dedup_by_id, is_last_page};

/// Whether another page may follow one of `page_len` records.
#[must_use]
pub fn has_more_after(page_len: usize) -> bool {
    page_len > 0 && !is_last_page(page_len)
}

/// Append `page` to `existing`, dropping ids already seen. Order is page
/// order with the first occurrence of each id kept.
pub fn merge_page(
    existing: &[MarketplaceRecord],
    page: Vec<MarketplaceRecord>,
) -> Vec<MarketplaceRecord> {
    let mut merged = Vec::with_capacity(existing.len() + page.len());
    merged.extend_from_slice(existing);
    merged.extend(page);
    dedup_by_id(merged)
}
