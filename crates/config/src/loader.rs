use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    schema::SkilldeckConfig,
    validate::{Severity, validate},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "skilldeck.toml",
    "skilldeck.yaml",
    "skilldeck.yml",
    "skilldeck.json",
];

const CACHE_FILENAME: &str = "sidebar-cache.json";

static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);
static DATA_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<SkilldeckConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

fn parse_config(raw: &str, path: &Path) -> Result<SkilldeckConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => toml::from_str(raw).map_err(|source| Error::Toml {
            path: path.to_path_buf(),
            source,
        }),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        "json" => serde_json::from_str(raw).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./skilldeck.{toml,yaml,yml,json}` (project-local)
/// 2. `<config_dir>/skilldeck.{toml,yaml,yml,json}` (user-global)
///
/// Returns `SkilldeckConfig::default()` if no config file is found or it fails
/// to parse. Fields rejected by [`validate`] are reset to their defaults.
pub fn discover_and_load() -> SkilldeckConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return SkilldeckConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => sanitize(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            SkilldeckConfig::default()
        },
    }
}

/// Replace every section that carries an error diagnostic with its default.
fn sanitize(mut cfg: SkilldeckConfig) -> SkilldeckConfig {
    let result = validate(&cfg);
    let defaults = SkilldeckConfig::default();
    for diag in result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
    {
        warn!(path = %diag.path, message = %diag.message, "invalid config value, using default");
        match diag.path.split('.').next() {
            Some("marketplace") => cfg.marketplace = defaults.marketplace.clone(),
            Some("sidebar") => cfg.sidebar = defaults.sidebar.clone(),
            Some("installer") => cfg.installer = defaults.installer.clone(),
            Some("workspace") => cfg.workspace = defaults.workspace.clone(),
            _ => {},
        }
    }
    cfg
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Override the user-global config directory (CLI `--config-dir`).
pub fn set_config_dir(path: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = Some(path);
    }
}

pub fn clear_config_dir() {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = None;
    }
}

/// Returns the user-global config directory (`~/.config/skilldeck/`).
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE.read().ok().and_then(|g| g.clone()) {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "skilldeck").map(|d| d.config_dir().to_path_buf())
}

/// Override the data directory (CLI `--data-dir`).
pub fn set_data_dir(path: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = Some(path);
    }
}

pub fn clear_data_dir() {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = None;
    }
}

/// Directory holding persisted sidebar state.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = DATA_DIR_OVERRIDE.read().ok().and_then(|g| g.clone()) {
        return dir;
    }
    directories::ProjectDirs::from("", "", "skilldeck")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".skilldeck"))
}

/// Path of the persisted cache file: `<data_dir>/sidebar-cache.json`.
pub fn cache_file_path() -> PathBuf {
    data_dir().join(CACHE_FILENAME)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_each_supported_format() {
        let tmp = tempfile::tempdir().unwrap();

        let toml_path = tmp.path().join("skilldeck.toml");
        std::fs::write(&toml_path, "[marketplace]\nsearch_limit = 20\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().marketplace.search_limit, 20);

        let yaml_path = tmp.path().join("skilldeck.yaml");
        std::fs::write(&yaml_path, "sidebar:\n  cache_ttl_secs: 60\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().sidebar.cache_ttl_secs, 60);

        let json_path = tmp.path().join("skilldeck.json");
        std::fs::write(&json_path, r#"{"installer":{"program":"bunx"}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().installer.program, "bunx");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("skilldeck.toml");
        std::fs::write(&path, "[marketplace\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("skilldeck.toml"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("skilldeck.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn sanitize_resets_invalid_sections() {
        let mut cfg = SkilldeckConfig::default();
        cfg.marketplace.base_url = "not a url".into();
        cfg.sidebar.search_debounce_ms = 42;
        let cfg = sanitize(cfg);
        assert_eq!(cfg.marketplace.base_url, crate::schema::DEFAULT_MARKETPLACE_URL);
        assert_eq!(cfg.sidebar.search_debounce_ms, 42);
    }
}
