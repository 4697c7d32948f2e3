use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    store::{CacheEntry, CacheStore},
};

const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

/// Cache store persisted as a single JSON file with atomic writes.
///
/// Reads are served from memory. Inside a tokio runtime the file is written
/// on the blocking pool so callers on an event loop never wait for disk;
/// outside one it is written before `set_at` returns.
pub struct JsonFileCacheStore {
    entries: Mutex<Entries>,
    writer: Arc<FileWriter>,
}

struct Entries {
    map: BTreeMap<String, CacheEntry>,
    seq: u64,
}

/// Serializes writes of whole-file snapshots; an older snapshot never
/// replaces a newer one.
struct FileWriter {
    path: PathBuf,
    written: Mutex<u64>,
}

impl JsonFileCacheStore {
    /// Open the store at `path`. A missing file yields an empty store; an
    /// unreadable or corrupt one is discarded with a warning.
    pub fn open(path: PathBuf) -> Self {
        let map = match load_file(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache file");
                BTreeMap::new()
            },
        };
        debug!(path = %path.display(), keys = map.len(), "opened cache store");
        Self {
            entries: Mutex::new(Entries { map, seq: 0 }),
            writer: Arc::new(FileWriter {
                path,
                written: Mutex::new(0),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.writer.path
    }
}

impl FileWriter {
    /// Write snapshot `seq` via temp file + rename, unless a later one
    /// already landed.
    fn write(&self, seq: u64, data: &str) -> Result<()> {
        let mut written = self.written.lock().map_err(|_| Error::Poisoned)?;
        if *written >= seq {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        *written = seq;
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<BTreeMap<String, CacheEntry>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let file: CacheFile = serde_json::from_str(&data)?;
    if file.version != FILE_FORMAT_VERSION {
        debug!(found = file.version, "cache file format changed, starting empty");
        return Ok(BTreeMap::new());
    }
    Ok(file.entries)
}

impl CacheStore for JsonFileCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.map.get(key).cloned()
    }

    fn set_at(&self, key: &str, data: Value, timestamp_ms: u64) -> Result<()> {
        let (seq, data) = {
            let mut entries = self.entries.lock().map_err(|_| Error::Poisoned)?;
            entries
                .map
                .insert(key.to_string(), CacheEntry { data, timestamp_ms });
            entries.seq += 1;
            let file = CacheFile {
                version: FILE_FORMAT_VERSION,
                entries: entries.map.clone(),
            };
            (entries.seq, serde_json::to_string_pretty(&file)?)
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let writer = Arc::clone(&self.writer);
                runtime.spawn_blocking(move || {
                    if let Err(e) = writer.write(seq, &data) {
                        warn!(path = %writer.path.display(), error = %e, "failed to write cache file");
                    }
                });
                Ok(())
            },
            Err(_) => self.writer.write(seq, &data),
        }
    }
}
