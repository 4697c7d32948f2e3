//! Installed skills: scanning agent directories, installing from
//! repositories through the skills CLI, removing installations and checking
//! for updates.
//!
//! A skill is a directory holding a `SKILL.md` (YAML frontmatter plus
//! markdown instructions) or a loose markdown file inside an agent's skills
//! directory.

pub mod command;
pub mod install;
pub mod parse;
pub mod remove;
pub mod scan;
pub mod types;
pub mod update;
#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use {
    command::SkillsCli,
    install::{CliInstaller, Installer},
    remove::{FsSkillRemover, RemovalReport, SkillRemover, managed_dirs},
    scan::{FsSkillScanner, ScanLocation, SkillScanner, home_dir},
    types::{AgentMode, CommandOutput, InstallMethod, InstallRequest, Level, SkillRecord},
    update::{CliUpdateChecker, UpdateChecker},
};
