//! The read-only view pushed to the renderer.

use {
    serde::{Deserialize, Serialize},
    skilldeck_marketplace::MarketplaceRecord,
    skilldeck_skills::SkillRecord,
};

use crate::{
    crossref::MatchIndex,
    state::{Panel, ScrollOffsets, SidebarState},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledRow {
    #[serde(flatten)]
    pub skill: SkillRecord,
    /// Id of the loaded listing this skill can be reinstalled from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace_match: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceRow {
    #[serde(flatten)]
    pub listing: MarketplaceRecord,
    /// Some installed skill resolves to this listing.
    pub installed: bool,
}

/// A self-consistent copy of the sidebar state.
///
/// `marketplace` holds search results while a search is active and the
/// browse listing otherwise; loading flags and `has_more` describe whichever
/// list is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// Increases with every publish; 0 before the coordinator first ran.
    pub revision: u64,
    pub installed: Vec<InstalledRow>,
    pub marketplace: Vec<MarketplaceRow>,
    pub is_loading_marketplace: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    /// Marketplace error, only set when there is nothing to show instead.
    pub error: Option<String>,
    /// Scan error, only set when there is no previous inventory.
    pub installed_error: Option<String>,
    pub active_panel: Panel,
    pub search_query: String,
    pub is_searching: bool,
    pub scroll: ScrollOffsets,
    pub is_scanning: bool,
    pub is_installing: bool,
    pub is_checking_updates: bool,
    pub is_updating: bool,
}

impl ViewSnapshot {
    pub fn build(state: &SidebarState) -> Self {
        let search_results = state.search.as_ref().map(|s| s.results.as_slice());
        let index = MatchIndex::new(
            state
                .browse
                .records
                .iter()
                .chain(search_results.unwrap_or_default()),
        );

        let installed: Vec<InstalledRow> = state
            .installed
            .iter()
            .map(|skill| InstalledRow {
                skill: skill.clone(),
                marketplace_match: index.resolve(skill).map(|r| r.id.clone()),
            })
            .collect();

        let shown = match &state.search {
            Some(search) => &search.results,
            None => &state.browse.records,
        };
        let marketplace = shown
            .iter()
            .map(|listing| MarketplaceRow {
                listing: listing.clone(),
                installed: installed
                    .iter()
                    .any(|i| i.marketplace_match.as_deref() == Some(listing.id.as_str())),
            })
            .collect();

        let mut snapshot = Self {
            installed,
            marketplace,
            installed_error: state.installed_error.clone(),
            active_panel: state.active_panel,
            scroll: state.scroll,
            is_scanning: state.scans_in_flight > 0,
            is_installing: state.is_installing,
            is_checking_updates: state.is_checking_updates,
            is_updating: state.is_updating,
            ..Self::default()
        };
        match &state.search {
            Some(search) => {
                snapshot.is_loading_marketplace = search.loading;
                snapshot.error = search.error.clone();
                snapshot.search_query = search.query.clone();
                snapshot.is_searching = true;
            },
            None => {
                snapshot.is_loading_marketplace = state.is_loading_marketplace;
                snapshot.is_loading_more = state.is_loading_more;
                snapshot.has_more = state.browse.has_more;
                snapshot.error = state.browse_error.clone();
            },
        }
        snapshot
    }

    /// Installed rows named `name`.
    pub fn installed_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a InstalledRow> {
        self.installed.iter().filter(move |r| r.skill.name == name)
    }
}
