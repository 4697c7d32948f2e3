//! Configuration loading and validation.
//!
//! Config files: `skilldeck.toml`, `skilldeck.yaml`, or `skilldeck.json`
//! Searched in `./` then `~/.config/skilldeck/`.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        cache_file_path, clear_config_dir, clear_data_dir, config_dir, data_dir, discover_and_load,
        load_config, set_config_dir, set_data_dir,
    },
    schema::{
        InstallerConfig, MarketplaceConfig, SidebarConfig, SkilldeckConfig, WorkspaceConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
