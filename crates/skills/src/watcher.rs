//! Filesystem watcher for skill directories.
//!
//! Emits [`InventoryChanged`] whenever an installation appears, disappears or
//! its markdown changes, so the sidebar can rescan installed skills.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use {
    anyhow::Result,
    notify_debouncer_full::{
        DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
        notify::{EventKind, RecommendedWatcher, RecursiveMode},
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

/// Something under a watched skill directory changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryChanged;

/// Watches skill directories with debouncing.
pub struct SkillWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl SkillWatcher {
    /// Start watching the given directories. Directories that do not exist
    /// yet are skipped.
    ///
    /// The watcher must be kept alive (not dropped) for events to continue.
    pub fn start(
        dirs: Vec<PathBuf>,
        debounce: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<InventoryChanged>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let roots = dirs.clone();

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed = events.iter().any(|event| {
                        matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) && event.paths.iter().any(|p| is_relevant(p, &roots))
                    });
                    if changed {
                        debug!("skill watcher: inventory changed");
                        let _ = tx.send(InventoryChanged);
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "skill watcher error");
                    }
                },
            }
        })?;

        let mut watcher = Self {
            _debouncer: debouncer,
        };

        for dir in &dirs {
            if dir.is_dir() {
                watcher._debouncer.watch(dir, RecursiveMode::Recursive)?;
                info!(dir = %dir.display(), "skill watcher: watching directory");
            }
        }

        Ok((watcher, rx))
    }
}

/// A markdown file anywhere below a root, or a direct child entry of a root
/// (a skill folder or link being added or removed).
fn is_relevant(path: &Path, roots: &[PathBuf]) -> bool {
    let is_markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"));
    if is_markdown {
        return true;
    }
    path.parent()
        .is_some_and(|parent| roots.iter().any(|r| r == parent))
}
