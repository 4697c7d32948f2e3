//! Mutable view state owned by the coordinator.

use std::{collections::HashMap, time::Duration};

use {
    serde::{Deserialize, Serialize},
    skilldeck_cache::{MarketplaceIdMap, is_fresh},
    skilldeck_marketplace::{MarketplaceRecord, dedup_by_id},
    skilldeck_skills::SkillRecord,
};

use crate::merge::{has_more_after, merge_page};

/// Which list the sidebar shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Installed,
    Marketplace,
}

/// Per-panel scroll positions, restored when the renderer reattaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollOffsets {
    pub installed: u32,
    pub marketplace: u32,
}

impl ScrollOffsets {
    pub fn set(&mut self, panel: Panel, offset: u32) {
        match panel {
            Panel::Installed => self.installed = offset,
            Panel::Marketplace => self.marketplace = offset,
        }
    }
}

/// The paginated all-time listing. Also the persisted browse cache payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseState {
    /// Page order, no duplicate ids.
    pub records: Vec<MarketplaceRecord>,
    pub has_more: bool,
    /// Next zero-based page to request.
    pub next_page: u32,
    /// When the listing was last written, in ms since the epoch.
    pub timestamp_ms: u64,
}

impl BrowseState {
    /// Start over from a freshly fetched page 0.
    pub fn replace_first_page(&mut self, page: Vec<MarketplaceRecord>, now_ms: u64) {
        self.has_more = has_more_after(page.len());
        self.records = dedup_by_id(page);
        self.next_page = 1;
        self.timestamp_ms = now_ms;
    }

    /// Merge the page numbered `next_page`.
    pub fn append_page(&mut self, page: Vec<MarketplaceRecord>, now_ms: u64) {
        self.has_more = has_more_after(page.len());
        self.records = merge_page(&self.records, page);
        self.next_page += 1;
        self.timestamp_ms = now_ms;
    }

    /// Non-empty and younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration, now_ms: u64) -> bool {
        !self.records.is_empty() && is_fresh(self.timestamp_ms, ttl, now_ms)
    }
}

/// Live search overlay. The browse listing stays untouched underneath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<MarketplaceRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Everything the coordinator owns. Only the coordinator task writes it.
#[derive(Debug, Default)]
pub struct SidebarState {
    pub installed: Vec<SkillRecord>,
    pub installed_error: Option<String>,
    pub scans_in_flight: u32,

    pub browse: BrowseState,
    pub is_loading_marketplace: bool,
    pub is_loading_more: bool,
    pub browse_error: Option<String>,

    pub search: Option<SearchState>,

    pub active_panel: Panel,
    pub scroll: ScrollOffsets,

    /// Latest update-check result per skill name.
    pub update_flags: HashMap<String, bool>,
    pub is_installing: bool,
    pub is_checking_updates: bool,
    pub is_updating: bool,
}

impl SidebarState {
    /// Replace the installed list with `scanned`, overlaying the persisted
    /// marketplace ids and the last update-check flags.
    pub fn set_installed(&mut self, mut scanned: Vec<SkillRecord>, ids: &MarketplaceIdMap) {
        for record in &mut scanned {
            record.marketplace_id = ids.get(&record.name).map(String::from);
            record.update_available = self.update_flags.get(&record.name).copied();
        }
        self.installed = scanned;
        self.installed_error = None;
    }

    /// Reapply overlays after the id map or the update flags changed.
    pub fn refresh_overlays(&mut self, ids: &MarketplaceIdMap) {
        let installed = std::mem::take(&mut self.installed);
        let error = self.installed_error.take();
        self.set_installed(installed, ids);
        self.installed_error = error;
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Distinct installed names, in list order.
    pub fn installed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.installed {
            if !names.contains(&record.name) {
                names.push(record.name.clone());
            }
        }
        names
    }
}
