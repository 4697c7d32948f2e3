//! Sidebar state and synchronization engine.
//!
//! A single [`Coordinator`] owns the view state and reconciles three
//! independently refreshing sources: the local inventory scan, the paginated
//! marketplace listing and live search. The UI sends [`Intent`]s in through a
//! [`SidebarHandle`] and reads [`ViewSnapshot`]s back out.

pub mod coordinator;
pub mod crossref;
pub mod error;
pub mod host;
pub mod intent;
pub mod merge;
pub mod snapshot;
pub mod state;

pub use {
    coordinator::{Coordinator, CoordinatorConfig, Services, SidebarEvent, SidebarHandle},
    error::{Error, Result},
    host::{DeleteScope, Host, InstallChoices, InstallPrompt, Notice, NoticeLevel},
    intent::Intent,
    snapshot::{InstalledRow, MarketplaceRow, ViewSnapshot},
    state::{BrowseState, Panel, ScrollOffsets, SearchState},
};
