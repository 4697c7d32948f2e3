use std::collections::BTreeMap;

use crate::{
    MARKETPLACE_IDS_KEY, MARKETPLACE_IDS_VERSION,
    error::Result,
    store::CacheStore,
    versioned::{load_versioned, store_versioned},
};

/// Persisted `skill-name -> marketplace-id` cross-reference.
///
/// The scanner cannot know where an installed skill came from, so the
/// coordinator records the id at install time and overlays it after each scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketplaceIdMap {
    ids: BTreeMap<String, String>,
}

impl MarketplaceIdMap {
    /// Load the mapping, treating any miss as an empty map.
    pub fn load(store: &dyn CacheStore) -> Self {
        let ids = load_versioned(store, MARKETPLACE_IDS_KEY, MARKETPLACE_IDS_VERSION)
            .map(|(ids, _)| ids)
            .unwrap_or_default();
        Self { ids }
    }

    pub fn persist(&self, store: &dyn CacheStore) -> Result<()> {
        store_versioned(store, MARKETPLACE_IDS_KEY, MARKETPLACE_IDS_VERSION, &self.ids)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    /// Returns `true` when the mapping changed.
    pub fn record(&mut self, name: impl Into<String>, id: impl Into<String>) -> bool {
        let id = id.into();
        let name = name.into();
        if self.ids.get(&name) == Some(&id) {
            return false;
        }
        self.ids.insert(name, id);
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.ids.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
