/// Config schema types (marketplace endpoint, sidebar timings, installer command, workspace roots).
use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MARKETPLACE_URL: &str = "https://skills.sh";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkilldeckConfig {
    pub marketplace: MarketplaceConfig,
    pub sidebar: SidebarConfig,
    pub installer: InstallerConfig,
    pub workspace: WorkspaceConfig,
}

/// Remote marketplace endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Base URL; `/api/skills/all-time/{page}` and `/api/search` are resolved against it.
    pub base_url: String,
    /// Maximum number of results requested per search.
    pub search_limit: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MARKETPLACE_URL.into(),
            search_limit: 50,
            timeout_secs: 30,
            user_agent: format!("skilldeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MarketplaceConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Coordinator timing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// How long a cached marketplace snapshot counts as fresh.
    pub cache_ttl_secs: u64,
    /// Delay between the last keystroke and the remote search call.
    pub search_debounce_ms: u64,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            search_debounce_ms: 150,
        }
    }
}

impl SidebarConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// External installer command. Subcommands (`add`, `check`, `update`) are
/// appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            program: "npx".into(),
            args: vec!["-y".into(), "skills".into()],
        }
    }
}

/// Project roots scanned for project-level skills. Empty means the current
/// working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub roots: Vec<PathBuf>,
}

impl WorkspaceConfig {
    /// Configured roots, or `cwd` when none are configured.
    #[must_use]
    pub fn resolved_roots(&self, cwd: PathBuf) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            vec![cwd]
        } else {
            self.roots.clone()
        }
    }
}
