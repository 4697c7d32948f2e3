//! Deleting installations.
//!
//! A symlinked installation points into the shared managed directory
//! (`.agents/skills`). Removing the link removes the shared copy as well only
//! when that copy lives inside the managed directory of the link's own level
//! and no surviving installation links to it or is it. Anything else is
//! never followed.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use {anyhow::Context, async_trait::async_trait};

use crate::types::{AgentMode, Level};

/// The shared `.agents/skills` directory of every project root and of `home`.
pub fn managed_dirs(project_roots: &[PathBuf], home: &Path) -> Vec<PathBuf> {
    project_roots
        .iter()
        .map(|root| root.join(AgentMode::Agents.relative_dir(Level::Project)))
        .chain(std::iter::once(
            home.join(AgentMode::Agents.relative_dir(Level::User)),
        ))
        .collect()
}

/// What sits at an installation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    File,
    Dir,
    /// `resolved` is the canonical target, `None` when dangling.
    Symlink { resolved: Option<PathBuf> },
}

/// An installation path and what was found there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// One filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RemovalStep {
    RemoveLink(PathBuf),
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
    /// Shared copy behind removed links.
    RemoveSharedTarget(PathBuf),
}

/// Decide what to delete. `managed_dirs` and entry paths must be canonical
/// up to their final component.
pub fn plan_removal(
    targets: &[ProbedEntry],
    survivors: &[ProbedEntry],
    managed_dirs: &[PathBuf],
) -> Vec<RemovalStep> {
    let mut steps = Vec::new();
    let mut shared = BTreeSet::new();
    let removed_paths: BTreeSet<&Path> = targets.iter().map(|t| t.path.as_path()).collect();

    for target in targets {
        match &target.kind {
            EntryKind::Missing => {},
            EntryKind::File => steps.push(RemovalStep::RemoveFile(target.path.clone())),
            EntryKind::Dir => steps.push(RemovalStep::RemoveDir(target.path.clone())),
            EntryKind::Symlink { resolved } => {
                steps.push(RemovalStep::RemoveLink(target.path.clone()));
                let Some(resolved) = resolved else {
                    continue;
                };
                let Some(dir) = owning_managed_dir(&target.path, managed_dirs) else {
                    continue;
                };
                if resolved == dir || !resolved.starts_with(dir) {
                    continue;
                }
                // Deleting the shared copy itself is already a step.
                if removed_paths.contains(resolved.as_path()) {
                    continue;
                }
                if survivors.iter().any(|s| still_uses(s, resolved)) {
                    continue;
                }
                shared.insert(resolved.clone());
            },
        }
    }

    steps.extend(shared.into_iter().map(RemovalStep::RemoveSharedTarget));
    steps
}

/// The managed directory of the level `path` belongs to: the one whose root
/// (the parent of `.agents`) is the closest ancestor of `path`.
fn owning_managed_dir<'a>(path: &Path, managed_dirs: &'a [PathBuf]) -> Option<&'a Path> {
    managed_dirs
        .iter()
        .filter_map(|dir| {
            let root = dir.parent()?.parent()?;
            path.starts_with(root).then_some((root.components().count(), dir))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, dir)| dir.as_path())
}

/// A survivor keeps the shared copy alive when it links to it or is it.
fn still_uses(survivor: &ProbedEntry, shared: &Path) -> bool {
    match &survivor.kind {
        EntryKind::Missing => false,
        EntryKind::Symlink { resolved } => resolved.as_deref() == Some(shared),
        EntryKind::File | EntryKind::Dir => survivor.path == shared,
    }
}

/// Inspect a path without following a final symlink.
pub fn probe(path: &Path) -> ProbedEntry {
    let kind = match std::fs::symlink_metadata(path) {
        Err(_) => EntryKind::Missing,
        Ok(meta) if meta.file_type().is_symlink() => EntryKind::Symlink {
            resolved: std::fs::canonicalize(path).ok(),
        },
        Ok(meta) if meta.is_dir() => EntryKind::Dir,
        Ok(_) => EntryKind::File,
    };
    ProbedEntry {
        path: path.to_path_buf(),
        kind,
    }
}

/// Result of a removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Installation paths that were deleted.
    pub removed: Vec<PathBuf>,
    /// Shared copies deleted because no remaining link used them.
    pub shared_removed: Vec<PathBuf>,
}

/// Deletes installations.
#[async_trait]
pub trait SkillRemover: Send + Sync {
    /// Delete `targets`. `survivors` are the other installations of the same
    /// skill that must keep working.
    async fn remove(
        &self,
        targets: Vec<PathBuf>,
        survivors: Vec<PathBuf>,
    ) -> anyhow::Result<RemovalReport>;
}

/// Filesystem remover guarding the shared managed directories.
pub struct FsSkillRemover {
    managed_dirs: Vec<PathBuf>,
}

impl FsSkillRemover {
    /// `managed_dirs` are the `<root>/.agents/skills` directories, one per
    /// level, as built by [`managed_dirs`]; they need not exist.
    pub fn new(managed_dirs: Vec<PathBuf>) -> Self {
        Self { managed_dirs }
    }
}

#[async_trait]
impl SkillRemover for FsSkillRemover {
    async fn remove(
        &self,
        targets: Vec<PathBuf>,
        survivors: Vec<PathBuf>,
    ) -> anyhow::Result<RemovalReport> {
        // A level without a shared directory still owns the links under its
        // root, so canonicalize roots rather than dropping missing dirs.
        let managed: Vec<PathBuf> = self
            .managed_dirs
            .iter()
            .map(|dir| {
                std::fs::canonicalize(dir).unwrap_or_else(|_| {
                    dir.parent()
                        .and_then(Path::parent)
                        .and_then(|root| std::fs::canonicalize(root).ok())
                        .map(|root| root.join(AgentMode::Agents.relative_dir(Level::Project)))
                        .unwrap_or_else(|| dir.clone())
                })
            })
            .collect();

        tokio::task::spawn_blocking(move || {
            let targets: Vec<ProbedEntry> = targets.iter().map(|p| probe(&locate(p))).collect();
            let survivors: Vec<ProbedEntry> = survivors.iter().map(|p| probe(&locate(p))).collect();
            let steps = plan_removal(&targets, &survivors, &managed);
            execute(steps)
        })
        .await?
    }
}

/// `path` with its parent canonicalized and the final component untouched,
/// so a link stays a link.
fn locate(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn execute(steps: Vec<RemovalStep>) -> anyhow::Result<RemovalReport> {
    let mut report = RemovalReport::default();
    for step in steps {
        match step {
            RemovalStep::RemoveLink(path) | RemovalStep::RemoveFile(path) => {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
                report.removed.push(path);
            },
            RemovalStep::RemoveDir(path) => {
                std::fs::remove_dir_all(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
                report.removed.push(path);
            },
            RemovalStep::RemoveSharedTarget(path) => {
                let result = if path.is_dir() {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                result.with_context(|| format!("failed to remove shared copy {}", path.display()))?;
                report.shared_removed.push(path);
            },
        }
    }
    tracing::info!(
        removed = report.removed.len(),
        shared_removed = report.shared_removed.len(),
        "removed skill installations"
    );
    Ok(report)
}
