use std::time::{Duration, SystemTime, UNIX_EPOCH};

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::error::Result;

/// A cached value and the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp_ms: u64,
}

/// Opaque get/set over persisted state.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store `data` under `key` with an explicit timestamp.
    fn set_at(&self, key: &str, data: Value, timestamp_ms: u64) -> Result<()>;

    /// Store `data` under `key`, stamped with the current time.
    fn set(&self, key: &str, data: Value) -> Result<()> {
        self.set_at(key, data, now_ms())
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// `true` when `entry` was written less than `ttl` before `now_ms`.
#[must_use]
pub fn is_fresh(entry_timestamp_ms: u64, ttl: Duration, now_ms: u64) -> bool {
    now_ms.saturating_sub(entry_timestamp_ms) < ttl.as_millis() as u64
}
