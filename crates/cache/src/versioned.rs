use {
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tracing::debug,
};

use crate::{error::Result, store::CacheStore};

/// Envelope tagging a cached payload with its schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u32,
    pub payload: T,
}

/// Read a versioned value. Absent keys, version mismatches and shape
/// mismatches are all a cache miss. Returns the payload and its write time.
pub fn load_versioned<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &str,
    version: u32,
) -> Option<(T, u64)> {
    let entry = store.get(key)?;
    let envelope: Versioned<serde_json::Value> = match serde_json::from_value(entry.data) {
        Ok(v) => v,
        Err(e) => {
            debug!(key, error = %e, "discarding unversioned cache value");
            return None;
        },
    };
    if envelope.version != version {
        debug!(
            key,
            found = envelope.version,
            expected = version,
            "discarding cache value with stale version"
        );
        return None;
    }
    match serde_json::from_value(envelope.payload) {
        Ok(payload) => Some((payload, entry.timestamp_ms)),
        Err(e) => {
            debug!(key, error = %e, "discarding cache value with unexpected shape");
            None
        },
    }
}

/// Write `payload` under `key` wrapped in a [`Versioned`] envelope.
pub fn store_versioned<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    version: u32,
    payload: &T,
) -> Result<()> {
    let data = serde_json::to_value(Versioned { version, payload })?;
    store.set(key, data)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::MemoryCacheStore, serde_json::json};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Page {
        items: Vec<String>,
        next_page: u32,
    }

    #[test]
    fn matching_version_round_trips() {
        let store = MemoryCacheStore::new();
        let page = Page {
            items: vec!["a".into()],
            next_page: 1,
        };
        store_versioned(&store, "k", 2, &page).unwrap();
        let (loaded, _ts) = load_versioned::<Page>(&store, "k", 2).unwrap();
        assert_eq!(loaded, page);
    }

    #[test]
    fn version_mismatch_is_a_miss() {
        let store = MemoryCacheStore::new();
        store_versioned(&store, "k", 1, &json!({"items": [], "next_page": 3})).unwrap();
        assert!(load_versioned::<Page>(&store, "k", 2).is_none());
    }

    #[test]
    fn legacy_unversioned_value_is_a_miss() {
        let store = MemoryCacheStore::new();
        store.set("k", json!({"items": ["a"], "next_page": 1})).unwrap();
        assert!(load_versioned::<Page>(&store, "k", 2).is_none());
    }

    #[test]
    fn wrong_shape_is_a_miss() {
        let store = MemoryCacheStore::new();
        store_versioned(&store, "k", 2, &json!({"items": 7})).unwrap();
        assert!(load_versioned::<Page>(&store, "k", 2).is_none());
    }
}
