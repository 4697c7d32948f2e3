//! The coordinator: single owner of sidebar state.
//!
//! Every mutation happens inside [`Coordinator::run`], one event at a time.
//! Slow work (scans, HTTP calls, installer subprocesses, dialogs) runs in
//! spawned tasks that post a completion [`SidebarEvent`] back to the loop.
//! Browse, load-more and search results carry the generation they were
//! dispatched with and are dropped unless it is still the latest of their
//! class. Scans carry no generation: the last one to complete wins.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    skilldeck_cache::{
        BROWSE_KEY, BROWSE_VERSION, CacheStore, INSTALLED_KEY, INSTALLED_VERSION,
        MarketplaceIdMap, load_versioned, now_ms, store_versioned,
    },
    skilldeck_config::SkilldeckConfig,
    skilldeck_marketplace::{self as marketplace, MarketplaceClient, MarketplaceRecord, dedup_by_id},
    skilldeck_skills::{
        AgentMode, CommandOutput, InstallRequest, Installer, Level, RemovalReport, SkillRecord,
        SkillRemover, SkillScanner, UpdateChecker, install::normalize_repository_ref,
    },
    tokio::sync::{mpsc, watch},
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    host::{DeleteScope, Host, InstallPrompt, Notice},
    intent::Intent,
    snapshot::ViewSnapshot,
    state::{BrowseState, Panel, SearchState, SidebarState},
};

const SKILL_FILE: &str = "SKILL.md";

/// Timing and sizing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// A cached browse listing younger than this is not refetched on start.
    pub cache_ttl: Duration,
    pub search_debounce: Duration,
    pub search_limit: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&SkilldeckConfig::default())
    }
}

impl From<&SkilldeckConfig> for CoordinatorConfig {
    fn from(config: &SkilldeckConfig) -> Self {
        Self {
            cache_ttl: config.sidebar.cache_ttl(),
            search_debounce: config.sidebar.search_debounce(),
            search_limit: config.marketplace.search_limit,
        }
    }
}

/// Collaborators the coordinator drives.
#[derive(Clone)]
pub struct Services {
    pub scanner: Arc<dyn SkillScanner>,
    pub marketplace: Arc<dyn MarketplaceClient>,
    pub installer: Arc<dyn Installer>,
    pub remover: Arc<dyn SkillRemover>,
    /// `None` disables update checks.
    pub updates: Option<Arc<dyn UpdateChecker>>,
    pub cache: Arc<dyn CacheStore>,
    pub host: Arc<dyn Host>,
}

/// Why a scan was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPurpose {
    Refresh,
    /// `names_before` is set for whole-repository installs so names that
    /// appear afterwards can be attributed to `repository`.
    AfterInstall {
        repository: String,
        names_before: Option<HashSet<String>>,
    },
    AfterDelete {
        name: String,
    },
    /// Re-check updates once the scan lands.
    AfterUpdate,
}

/// Input to the coordinator loop: user intents, filesystem notifications and
/// completions posted by the coordinator's own tasks.
#[derive(Debug)]
pub enum SidebarEvent {
    Intent(Intent),
    /// Something changed in a watched skills directory.
    InventoryChanged,
    ScanFinished {
        purpose: ScanPurpose,
        result: std::result::Result<Vec<SkillRecord>, String>,
    },
    BrowseLoaded {
        generation: u64,
        result: marketplace::Result<Vec<MarketplaceRecord>>,
    },
    MoreLoaded {
        generation: u64,
        page: u32,
        result: marketplace::Result<Vec<MarketplaceRecord>>,
    },
    /// The debounce delay for a keystroke elapsed.
    SearchDue {
        generation: u64,
    },
    SearchLoaded {
        generation: u64,
        result: marketplace::Result<Vec<MarketplaceRecord>>,
    },
    InstallCancelled,
    InstallFinished {
        request: InstallRequest,
        /// Listing id to remember for an explicitly named skill.
        listing_id: Option<String>,
        names_before: Option<HashSet<String>>,
        result: std::result::Result<CommandOutput, String>,
    },
    DeleteFinished {
        name: String,
        result: std::result::Result<RemovalReport, String>,
    },
    UpdatesChecked {
        result: std::result::Result<HashMap<String, bool>, String>,
    },
    UpdateAllFinished {
        result: std::result::Result<CommandOutput, String>,
    },
}

impl From<Intent> for SidebarEvent {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}

/// Latest dispatched request per operation class.
#[derive(Debug, Default)]
struct Generations {
    browse: u64,
    more: u64,
    search: u64,
    debounce: u64,
}

/// The UI's end: send intents, read snapshots.
#[derive(Clone)]
pub struct SidebarHandle {
    events: mpsc::UnboundedSender<SidebarEvent>,
    snapshots: watch::Receiver<ViewSnapshot>,
}

impl SidebarHandle {
    pub fn intent(&self, intent: Intent) -> Result<()> {
        self.send(SidebarEvent::Intent(intent))
    }

    pub fn send(&self, event: SidebarEvent) -> Result<()> {
        self.events.send(event).map_err(|_| Error::Stopped)
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ViewSnapshot) -> bool,
    ) -> Result<ViewSnapshot> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| Error::Stopped)?;
        Ok(snapshot.clone())
    }
}

/// Owns the sidebar state. Drive it with [`Coordinator::run`].
pub struct Coordinator {
    services: Services,
    config: CoordinatorConfig,
    state: SidebarState,
    ids: MarketplaceIdMap,
    generations: Generations,
    revision: u64,
    /// Weak so the loop ends once every handle and task is gone.
    events: mpsc::WeakUnboundedSender<SidebarEvent>,
    inbox: mpsc::UnboundedReceiver<SidebarEvent>,
    snapshots: watch::Sender<ViewSnapshot>,
}

impl Coordinator {
    pub fn new(services: Services, config: CoordinatorConfig) -> (Self, SidebarHandle) {
        let (events, inbox) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(ViewSnapshot::default());
        let ids = MarketplaceIdMap::load(services.cache.as_ref());
        let coordinator = Self {
            services,
            config,
            state: SidebarState::default(),
            ids,
            generations: Generations::default(),
            revision: 0,
            events: events.downgrade(),
            inbox,
            snapshots,
        };
        let handle = SidebarHandle {
            events,
            snapshots: snapshot_rx,
        };
        (coordinator, handle)
    }

    /// Build a coordinator and run it on the current tokio runtime.
    pub fn spawn(services: Services, config: CoordinatorConfig) -> SidebarHandle {
        let (coordinator, handle) = Self::new(services, config);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Activate, then process events until every sender is gone.
    pub async fn run(mut self) {
        self.activate();
        while let Some(event) = self.inbox.recv().await {
            self.handle_event(event);
        }
        debug!("sidebar coordinator stopped");
    }

    /// Render cached data immediately, then refresh the inventory and, unless
    /// the cached listing is fresh, the first marketplace page.
    fn activate(&mut self) {
        let cache = self.services.cache.as_ref();
        if let Some((installed, _)) =
            load_versioned::<Vec<SkillRecord>>(cache, INSTALLED_KEY, INSTALLED_VERSION)
        {
            self.state.set_installed(installed, &self.ids);
        }
        if let Some((mut browse, timestamp_ms)) =
            load_versioned::<BrowseState>(cache, BROWSE_KEY, BROWSE_VERSION)
        {
            browse.timestamp_ms = timestamp_ms;
            self.state.browse = browse;
        }
        info!(
            installed = self.state.installed.len(),
            listings = self.state.browse.records.len(),
            "sidebar activated from cache"
        );

        self.spawn_scan(ScanPurpose::Refresh);
        if self.state.browse.is_fresh(self.config.cache_ttl, now_ms()) {
            debug!("cached marketplace listing is fresh, skipping fetch");
        } else {
            self.fetch_first_page();
        }
        self.publish();
    }

    fn handle_event(&mut self, event: SidebarEvent) {
        match event {
            SidebarEvent::Intent(intent) => self.handle_intent(intent),
            SidebarEvent::InventoryChanged => {
                debug!("skills directory changed, rescanning");
                self.spawn_scan(ScanPurpose::Refresh);
                self.publish();
            },
            SidebarEvent::ScanFinished { purpose, result } => {
                self.on_scan_finished(purpose, result)
            },
            SidebarEvent::BrowseLoaded { generation, result } => {
                self.on_browse_loaded(generation, result)
            },
            SidebarEvent::MoreLoaded {
                generation,
                page,
                result,
            } => self.on_more_loaded(generation, page, result),
            SidebarEvent::SearchDue { generation } => self.on_search_due(generation),
            SidebarEvent::SearchLoaded { generation, result } => {
                self.on_search_loaded(generation, result)
            },
            SidebarEvent::InstallCancelled => {
                debug!("install cancelled");
                self.state.is_installing = false;
                self.publish();
            },
            SidebarEvent::InstallFinished {
                request,
                listing_id,
                names_before,
                result,
            } => self.on_install_finished(request, listing_id, names_before, result),
            SidebarEvent::DeleteFinished { name, result } => self.on_delete_finished(name, result),
            SidebarEvent::UpdatesChecked { result } => self.on_updates_checked(result),
            SidebarEvent::UpdateAllFinished { result } => self.on_update_all_finished(result),
        }
    }

    fn handle_intent(&mut self, intent: Intent) {
        debug!(?intent, "intent");
        match intent {
            Intent::Refresh => self.refresh(),
            Intent::Search { query } => self.search(query),
            Intent::LoadMore => self.load_more(),
            Intent::SetActivePanel { panel } => self.set_active_panel(panel),
            Intent::Install {
                repository_ref,
                skill_name,
            } => self.install(repository_ref, skill_name),
            Intent::DeleteSkill {
                path,
                name,
                level,
                agent_mode,
            } => self.delete(path, name, level, agent_mode),
            Intent::OpenSkill { path } => self.open_skill(path),
            Intent::OpenUrl { url } => self.open_url(url),
            Intent::PanelScroll { panel, offset } => {
                // Not published: the next snapshot carries it.
                self.state.scroll.set(panel, offset);
            },
            Intent::WebviewReady => self.publish(),
            Intent::CheckUpdates => {
                self.start_update_check();
                self.publish();
            },
            Intent::UpdateAllSkills => self.update_all(),
        }
    }

    // ── Plumbing ────────────────────────────────────────────────────────────

    fn publish(&mut self) {
        self.revision += 1;
        let mut snapshot = ViewSnapshot::build(&self.state);
        snapshot.revision = self.revision;
        self.snapshots.send_replace(snapshot);
    }

    /// Run `task` off the loop and post its event, if any, back.
    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = Option<SidebarEvent>> + Send + 'static,
    {
        let Some(events) = self.events.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Some(event) = task.await {
                let _ = events.send(event);
            }
        });
    }

    fn notify(&self, notice: Notice) {
        self.services.host.notify(notice);
    }

    fn persist_browse(&self) {
        if let Err(e) = store_versioned(
            self.services.cache.as_ref(),
            BROWSE_KEY,
            BROWSE_VERSION,
            &self.state.browse,
        ) {
            warn!(error = %e, "failed to cache marketplace listing");
        }
    }

    fn persist_installed(&self) {
        if let Err(e) = store_versioned(
            self.services.cache.as_ref(),
            INSTALLED_KEY,
            INSTALLED_VERSION,
            &self.state.installed,
        ) {
            warn!(error = %e, "failed to cache installed skills");
        }
    }

    fn persist_ids(&self) {
        if let Err(e) = self.ids.persist(self.services.cache.as_ref()) {
            warn!(error = %e, "failed to persist marketplace ids");
        }
    }

    // ── Inventory ───────────────────────────────────────────────────────────

    fn spawn_scan(&mut self, purpose: ScanPurpose) {
        self.state.scans_in_flight += 1;
        let scanner = Arc::clone(&self.services.scanner);
        self.spawn_task(async move {
            let result = scanner.scan().await.map_err(|e| format!("{e:#}"));
            Some(SidebarEvent::ScanFinished { purpose, result })
        });
    }

    fn on_scan_finished(
        &mut self,
        purpose: ScanPurpose,
        result: std::result::Result<Vec<SkillRecord>, String>,
    ) {
        self.state.scans_in_flight = self.state.scans_in_flight.saturating_sub(1);
        match result {
            Ok(records) => {
                let mut ids_changed = false;
                match &purpose {
                    ScanPurpose::AfterInstall {
                        repository,
                        names_before: Some(before),
                    } => {
                        for record in records.iter().filter(|r| !before.contains(&r.name)) {
                            let id = MarketplaceRecord::synthetic_id(repository, &record.name);
                            ids_changed |= self.ids.record(record.name.clone(), id);
                        }
                    },
                    ScanPurpose::AfterDelete { name } if !records.iter().any(|r| &r.name == name) => {
                        ids_changed |= self.ids.remove(name);
                    },
                    _ => {},
                }
                if ids_changed {
                    self.persist_ids();
                }

                debug!(count = records.len(), ?purpose, "scan applied");
                self.state.set_installed(records, &self.ids);
                self.persist_installed();
            },
            Err(message) => {
                warn!(error = %message, "skill scan failed, keeping previous inventory");
                if self.state.installed.is_empty() {
                    self.state.installed_error = Some(message);
                }
            },
        }

        if purpose == ScanPurpose::AfterUpdate {
            self.start_update_check();
        }
        self.publish();
    }

    // ── Browse and load more ────────────────────────────────────────────────

    fn refresh(&mut self) {
        self.spawn_scan(ScanPurpose::Refresh);
        self.fetch_first_page();
        if self.state.is_searching() {
            self.dispatch_search();
        }
        self.publish();
    }

    /// Fetch page 0, superseding any browse or load-more request in flight.
    fn fetch_first_page(&mut self) {
        self.generations.browse += 1;
        self.generations.more += 1;
        let generation = self.generations.browse;
        self.state.is_loading_marketplace = true;
        self.state.is_loading_more = false;

        let client = Arc::clone(&self.services.marketplace);
        self.spawn_task(async move {
            let result = client.fetch_page(0).await;
            Some(SidebarEvent::BrowseLoaded { generation, result })
        });
    }

    fn on_browse_loaded(
        &mut self,
        generation: u64,
        result: marketplace::Result<Vec<MarketplaceRecord>>,
    ) {
        if generation != self.generations.browse {
            debug!(generation, latest = self.generations.browse, "discarding stale browse response");
            return;
        }
        self.state.is_loading_marketplace = false;
        match result {
            Ok(page) => {
                self.state.browse.replace_first_page(page, now_ms());
                self.state.browse_error = None;
                self.persist_browse();
            },
            Err(e) if self.state.browse.records.is_empty() => {
                warn!(error = %e, "marketplace fetch failed");
                self.state.browse_error = Some(e.to_string());
            },
            Err(e) => {
                warn!(error = %e, "marketplace fetch failed, keeping loaded listing");
            },
        }
        self.publish();
    }

    fn load_more(&mut self) {
        if self.state.is_loading_more
            || self.state.is_loading_marketplace
            || self.state.is_searching()
            || !self.state.browse.has_more
        {
            debug!("load more ignored");
            return;
        }
        self.generations.more += 1;
        let generation = self.generations.more;
        let page = self.state.browse.next_page;
        self.state.is_loading_more = true;

        let client = Arc::clone(&self.services.marketplace);
        self.spawn_task(async move {
            let result = client.fetch_page(page).await;
            Some(SidebarEvent::MoreLoaded {
                generation,
                page,
                result,
            })
        });
        self.publish();
    }

    fn on_more_loaded(
        &mut self,
        generation: u64,
        page: u32,
        result: marketplace::Result<Vec<MarketplaceRecord>>,
    ) {
        if generation != self.generations.more {
            debug!(generation, page, "discarding stale page");
            return;
        }
        self.state.is_loading_more = false;
        match result {
            Ok(records) if page == self.state.browse.next_page => {
                debug!(page, count = records.len(), "merging page");
                self.state.browse.append_page(records, now_ms());
                self.persist_browse();
            },
            Ok(_) => {
                debug!(page, expected = self.state.browse.next_page, "page out of sequence");
            },
            Err(e) => {
                warn!(error = %e, page, "loading more listings failed");
            },
        }
        self.publish();
    }

    fn set_active_panel(&mut self, panel: Panel) {
        self.state.active_panel = panel;
        match panel {
            Panel::Marketplace
                if !self.state.is_searching()
                    && !self.state.is_loading_marketplace
                    && !self.state.browse.is_fresh(self.config.cache_ttl, now_ms()) =>
            {
                self.fetch_first_page();
            },
            Panel::Installed
                if self.state.installed.is_empty() && self.state.scans_in_flight == 0 =>
            {
                self.spawn_scan(ScanPurpose::Refresh);
            },
            _ => {},
        }
        self.publish();
    }

    // ── Search ──────────────────────────────────────────────────────────────

    /// Apply the typed query now; the remote call waits for the debounce.
    fn search(&mut self, query: String) {
        self.state.active_panel = Panel::Marketplace;
        self.generations.debounce += 1;

        if query.trim().is_empty() {
            self.generations.search += 1;
            let was_searching = self.state.search.take().is_some();
            self.publish();
            // Revalidate the restored listing in the background.
            if was_searching
                && !self.state.is_loading_marketplace
                && !self.state.browse.is_fresh(self.config.cache_ttl, now_ms())
            {
                self.fetch_first_page();
                self.publish();
            }
            return;
        }

        // Results for an older query are no longer wanted.
        self.generations.search += 1;
        let search = self.state.search.get_or_insert_with(SearchState::default);
        search.query = query;
        search.loading = true;
        search.error = None;

        let generation = self.generations.debounce;
        let delay = self.config.search_debounce;
        self.spawn_task(async move {
            tokio::time::sleep(delay).await;
            Some(SidebarEvent::SearchDue { generation })
        });
        self.publish();
    }

    fn on_search_due(&mut self, generation: u64) {
        if generation != self.generations.debounce {
            return;
        }
        self.dispatch_search();
    }

    fn dispatch_search(&mut self) {
        let Some(search) = self.state.search.as_mut() else {
            return;
        };
        search.loading = true;
        let query = search.query.trim().to_string();
        self.generations.search += 1;
        let generation = self.generations.search;
        let limit = self.config.search_limit;

        debug!(%query, generation, "dispatching search");
        let client = Arc::clone(&self.services.marketplace);
        self.spawn_task(async move {
            let result = client.search(&query, limit).await;
            Some(SidebarEvent::SearchLoaded { generation, result })
        });
    }

    fn on_search_loaded(
        &mut self,
        generation: u64,
        result: marketplace::Result<Vec<MarketplaceRecord>>,
    ) {
        if generation != self.generations.search {
            debug!(generation, latest = self.generations.search, "discarding stale search response");
            return;
        }
        let Some(search) = self.state.search.as_mut() else {
            return;
        };
        search.loading = false;
        match result {
            Ok(records) => {
                search.results = dedup_by_id(records);
                search.error = None;
            },
            Err(e) => {
                warn!(error = %e, query = %search.query, "marketplace search failed");
                search.results.clear();
                search.error = Some(e.to_string());
            },
        }
        self.publish();
    }

    // ── Install ─────────────────────────────────────────────────────────────

    fn install(&mut self, repository_ref: String, skill_name: Option<String>) {
        if self.state.is_installing {
            debug!(%repository_ref, "install already running, ignoring");
            return;
        }
        let repository = match normalize_repository_ref(&repository_ref) {
            Ok(repository) => repository,
            Err(e) => {
                self.notify(Notice::error(format!("Cannot install: {e:#}")));
                return;
            },
        };
        let skill_name = skill_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let listing_id = skill_name
            .as_deref()
            .map(|name| self.listing_id_for(&repository, name));
        let names_before = skill_name
            .is_none()
            .then(|| self.state.installed.iter().map(|r| r.name.clone()).collect());

        self.state.is_installing = true;
        let host = Arc::clone(&self.services.host);
        let installer = Arc::clone(&self.services.installer);
        self.spawn_task(async move {
            let prompt = InstallPrompt {
                repository_ref: repository.clone(),
                skill_name: skill_name.clone(),
            };
            let Some(choices) = host.pick_install_options(&prompt).await else {
                return Some(SidebarEvent::InstallCancelled);
            };
            let request = InstallRequest {
                repository_ref: repository,
                skill_name,
                scope: choices.scope,
                agents: choices.agents,
                method: choices.method,
                telemetry: choices.telemetry,
            };
            let result = installer
                .install(&request)
                .await
                .map_err(|e| format!("{e:#}"));
            Some(SidebarEvent::InstallFinished {
                request,
                listing_id,
                names_before,
                result,
            })
        });
        self.publish();
    }

    /// Id of the loaded listing for `name` in `repository`, else the
    /// synthetic `repository/name`.
    fn listing_id_for(&self, repository: &str, name: &str) -> String {
        let searched = self.state.search.iter().flat_map(|s| s.results.iter());
        self.state
            .browse
            .records
            .iter()
            .chain(searched)
            .find(|r| r.source.eq_ignore_ascii_case(repository) && (r.skill_id == name || r.name == name))
            .map(|r| r.id.clone())
            .unwrap_or_else(|| MarketplaceRecord::synthetic_id(repository, name))
    }

    fn on_install_finished(
        &mut self,
        request: InstallRequest,
        listing_id: Option<String>,
        names_before: Option<HashSet<String>>,
        result: std::result::Result<CommandOutput, String>,
    ) {
        self.state.is_installing = false;
        let label = match &request.skill_name {
            Some(name) => format!("{name} from {}", request.repository_ref),
            None => request.repository_ref.clone(),
        };
        match result {
            Ok(output) if output.success => {
                info!(skill = %label, "install succeeded");
                if let (Some(name), Some(id)) = (&request.skill_name, listing_id)
                    && self.ids.record(name.clone(), id)
                {
                    self.persist_ids();
                }
                self.notify(Notice::info(format!("Installed {label}")));
                self.spawn_scan(ScanPurpose::AfterInstall {
                    repository: request.repository_ref,
                    names_before,
                });
            },
            Ok(output) => {
                let detail = output
                    .diagnostic()
                    .unwrap_or_else(|| "installer exited with an error".into());
                self.notify(Notice::error(format!("Failed to install {label}: {detail}")));
            },
            Err(message) => {
                self.notify(Notice::error(format!("Failed to install {label}: {message}")));
            },
        }
        self.publish();
    }

    // ── Delete ──────────────────────────────────────────────────────────────

    fn delete(&mut self, path: PathBuf, name: String, level: Level, agent_mode: AgentMode) {
        let installations: Vec<SkillRecord> = self
            .state
            .installed
            .iter()
            .filter(|r| r.name == name)
            .cloned()
            .collect();
        let selected = installations
            .iter()
            .find(|r| r.path == path)
            .cloned()
            .unwrap_or_else(|| SkillRecord {
                name: name.clone(),
                description: String::new(),
                path,
                level,
                agent_mode,
                updated_at: None,
                marketplace_id: None,
                update_available: None,
            });

        let host = Arc::clone(&self.services.host);
        let remover = Arc::clone(&self.services.remover);
        let others: Vec<PathBuf> = installations
            .iter()
            .filter(|r| r.path != selected.path)
            .map(|r| r.path.clone())
            .collect();
        self.spawn_task(async move {
            let scope = if others.is_empty() {
                DeleteScope::Selected
            } else {
                host.choose_delete_scope(&selected, &installations).await?
            };

            let (targets, survivors) = match scope {
                DeleteScope::Selected => (vec![selected.path.clone()], others),
                DeleteScope::All => (
                    std::iter::once(selected.path.clone()).chain(others).collect(),
                    Vec::new(),
                ),
            };
            debug!(name = %selected.name, ?scope, targets = targets.len(), "removing skill");
            let result = remover
                .remove(targets, survivors)
                .await
                .map_err(|e| format!("{e:#}"));
            Some(SidebarEvent::DeleteFinished {
                name: selected.name,
                result,
            })
        });
    }

    fn on_delete_finished(
        &mut self,
        name: String,
        result: std::result::Result<RemovalReport, String>,
    ) {
        match result {
            Ok(report) => {
                let count = report.removed.len();
                info!(%name, count, shared = report.shared_removed.len(), "skill removed");
                let noun = if count == 1 { "installation" } else { "installations" };
                self.notify(Notice::info(format!("Removed {name} ({count} {noun})")));
                self.spawn_scan(ScanPurpose::AfterDelete { name });
            },
            Err(message) => {
                self.notify(Notice::error(format!("Failed to remove {name}: {message}")));
                // Part of the removal may have happened.
                self.spawn_scan(ScanPurpose::Refresh);
            },
        }
        self.publish();
    }

    // ── Open ────────────────────────────────────────────────────────────────

    fn open_skill(&self, path: PathBuf) {
        let host = Arc::clone(&self.services.host);
        self.spawn_task(async move {
            let document = skill_document(&path);
            if let Err(e) = host.open_path(&document).await {
                host.notify(Notice::error(format!("Cannot open {}: {e:#}", document.display())));
            }
            None
        });
    }

    fn open_url(&self, url: String) {
        let host = Arc::clone(&self.services.host);
        self.spawn_task(async move {
            if let Err(e) = host.open_url(&url).await {
                host.notify(Notice::error(format!("Cannot open {url}: {e:#}")));
            }
            None
        });
    }

    // ── Updates ─────────────────────────────────────────────────────────────

    fn start_update_check(&mut self) {
        if self.state.is_checking_updates {
            debug!("update check already running, ignoring");
            return;
        }
        let Some(checker) = self.services.updates.clone() else {
            self.notify(Notice::warning("Update checks are not available"));
            return;
        };
        let names = self.state.installed_names();
        self.state.is_checking_updates = true;
        self.spawn_task(async move {
            let result = checker.check(&names).await.map_err(|e| format!("{e:#}"));
            Some(SidebarEvent::UpdatesChecked { result })
        });
    }

    fn on_updates_checked(&mut self, result: std::result::Result<HashMap<String, bool>, String>) {
        self.state.is_checking_updates = false;
        match result {
            Ok(flags) => {
                let outdated = flags.values().filter(|v| **v).count();
                self.state.update_flags = flags;
                self.state.refresh_overlays(&self.ids);
                let message = match outdated {
                    0 => "All skills are up to date".to_string(),
                    1 => "1 skill has an update available".to_string(),
                    n => format!("{n} skills have updates available"),
                };
                self.notify(Notice::info(message));
            },
            Err(message) => {
                self.notify(Notice::error(format!("Update check failed: {message}")));
            },
        }
        self.publish();
    }

    fn update_all(&mut self) {
        if self.state.is_updating {
            debug!("update already running, ignoring");
            return;
        }
        let Some(checker) = self.services.updates.clone() else {
            self.notify(Notice::warning("Updates are not available"));
            return;
        };
        self.state.is_updating = true;
        self.spawn_task(async move {
            let result = checker.update_all().await.map_err(|e| format!("{e:#}"));
            Some(SidebarEvent::UpdateAllFinished { result })
        });
        self.publish();
    }

    fn on_update_all_finished(&mut self, result: std::result::Result<CommandOutput, String>) {
        self.state.is_updating = false;
        match result {
            Ok(output) if output.success => {
                self.notify(Notice::info("Updated all skills"));
                self.state.update_flags.clear();
                self.spawn_scan(ScanPurpose::AfterUpdate);
            },
            Ok(output) => {
                let detail = output
                    .diagnostic()
                    .unwrap_or_else(|| "updater exited with an error".into());
                self.notify(Notice::error(format!("Update failed: {detail}")));
            },
            Err(message) => self.notify(Notice::error(format!("Update failed: {message}"))),
        }
        self.publish();
    }
}

/// The document to open for an installation: `SKILL.md` inside a skill
/// directory, the file itself otherwise.
fn skill_document(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(SKILL_FILE)
    } else {
        path.to_path_buf()
    }
}
