use std::{
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use async_trait::async_trait;

use crate::{
    parse,
    types::{AgentMode, Level, SkillRecord},
};

const SKILL_FILE: &str = "SKILL.md";

/// The current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Enumerates installed skills.
#[async_trait]
pub trait SkillScanner: Send + Sync {
    /// Scan every level×agent directory. Missing directories yield no records.
    async fn scan(&self) -> anyhow::Result<Vec<SkillRecord>>;

    /// Directories the scan reads, for change watching.
    fn directories(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// One directory to scan and how records found there are labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLocation {
    pub dir: PathBuf,
    pub level: Level,
    pub agent_mode: AgentMode,
}

/// Filesystem scanner over project roots and the home directory.
pub struct FsSkillScanner {
    locations: Vec<ScanLocation>,
}

impl FsSkillScanner {
    pub fn new(locations: Vec<ScanLocation>) -> Self {
        Self { locations }
    }

    /// Every agent directory under each project root and under `home`.
    pub fn default_locations(project_roots: &[PathBuf], home: &Path) -> Vec<ScanLocation> {
        let mut locations = Vec::new();
        for root in project_roots {
            for agent_mode in AgentMode::ALL {
                locations.push(ScanLocation {
                    dir: root.join(agent_mode.relative_dir(Level::Project)),
                    level: Level::Project,
                    agent_mode,
                });
            }
        }
        for agent_mode in AgentMode::ALL {
            locations.push(ScanLocation {
                dir: home.join(agent_mode.relative_dir(Level::User)),
                level: Level::User,
                agent_mode,
            });
        }
        locations.dedup();
        locations
    }

    pub fn for_roots(project_roots: &[PathBuf], home: &Path) -> Self {
        Self::new(Self::default_locations(project_roots, home))
    }

    pub fn locations(&self) -> &[ScanLocation] {
        &self.locations
    }
}

#[async_trait]
impl SkillScanner for FsSkillScanner {
    async fn scan(&self) -> anyhow::Result<Vec<SkillRecord>> {
        let locations = self.locations.clone();
        let mut skills = tokio::task::spawn_blocking(move || {
            let mut skills = Vec::new();
            for location in &locations {
                scan_location(location, &mut skills);
            }
            skills
        })
        .await?;

        skills.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.level.cmp(&b.level))
                .then(a.agent_mode.cmp(&b.agent_mode))
                .then(a.path.cmp(&b.path))
        });
        tracing::debug!(count = skills.len(), "scanned installed skills");
        Ok(skills)
    }

    fn directories(&self) -> Vec<PathBuf> {
        self.locations.iter().map(|l| l.dir.clone()).collect()
    }
}

/// Scan one directory: subdirectories holding `SKILL.md` and loose `*.md` files.
fn scan_location(location: &ScanLocation, skills: &mut Vec<SkillRecord>) {
    let entries = match std::fs::read_dir(&location.dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        // `is_dir` / `is_file` follow symlinks, so linked installs are included.
        let (skill_file, fallback_name) = if path.is_dir() {
            let skill_md = path.join(SKILL_FILE);
            if !skill_md.is_file() {
                continue;
            }
            (skill_md, file_name.to_string())
        } else if path.is_file() && path.extension().is_some_and(|e| e == "md") {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(file_name);
            (path.clone(), stem.to_string())
        } else {
            continue;
        };

        let content = match std::fs::read_to_string(&skill_file) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(?skill_file, %e, "failed to read skill file");
                continue;
            },
        };
        let (name, description) = parse::describe(&content, &fallback_name);
        skills.push(SkillRecord {
            name,
            description,
            path,
            level: location.level,
            agent_mode: location.agent_mode,
            updated_at: modified_ms(&skill_file),
            marketplace_id: None,
            update_available: None,
        });
    }
}

fn modified_ms(path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_millis() as u64)
}
