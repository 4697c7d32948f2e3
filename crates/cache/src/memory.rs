use std::{collections::HashMap, sync::Mutex};

use serde_json::Value;

use crate::{
    error::{Error, Result},
    store::{CacheEntry, CacheStore},
};

/// Non-persistent store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set_at(&self, key: &str, data: Value, timestamp_ms: u64) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| Error::Poisoned)?
            .insert(key.to_string(), CacheEntry { data, timestamp_ms });
        Ok(())
    }
}
