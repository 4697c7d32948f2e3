#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    skilldeck_cache::MemoryCacheStore,
    skilldeck_marketplace::{self as marketplace, MarketplaceClient, MarketplaceRecord},
    skilldeck_sidebar::{
        Coordinator, CoordinatorConfig, DeleteScope, Host, InstallChoices, InstallPrompt, Notice,
        Services, SidebarHandle, ViewSnapshot,
    },
    skilldeck_skills::{
        AgentMode, CommandOutput, InstallMethod, InstallRequest, Installer, Level, RemovalReport,
        SkillRecord, SkillRemover, SkillScanner, UpdateChecker,
    },
    tokio::sync::Notify,
};

// ── Records ─────────────────────────────────────────────────────────────────

pub fn listing(source: &str, skill: &str) -> MarketplaceRecord {
    MarketplaceRecord {
        id: MarketplaceRecord::synthetic_id(source, skill),
        skill_id: skill.into(),
        name: skill.into(),
        install_count: 100,
        source: source.into(),
    }
}

pub fn page_of(prefix: &str, n: usize) -> Vec<MarketplaceRecord> {
    (0..n)
        .map(|i| listing("acme/tools", &format!("{prefix}-{i}")))
        .collect()
}

pub fn installed(name: &str, level: Level, agent_mode: AgentMode) -> SkillRecord {
    let root = match level {
        Level::Project => "/work/project",
        Level::User => "/home/user",
    };
    SkillRecord {
        name: name.into(),
        description: format!("{name} skill"),
        path: PathBuf::from(root)
            .join(agent_mode.relative_dir(level))
            .join(name),
        level,
        agent_mode,
        updated_at: Some(1_700_000_000_000),
        marketplace_id: None,
        update_available: None,
    }
}

pub fn ids(records: &[MarketplaceRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

pub fn shown_ids(snapshot: &ViewSnapshot) -> Vec<String> {
    snapshot
        .marketplace
        .iter()
        .map(|r| r.listing.id.clone())
        .collect()
}

// ── Gates ───────────────────────────────────────────────────────────────────

/// Named barriers: a call whose key has a gate waits until it is released.
#[derive(Default)]
pub struct Gates {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl Gates {
    pub fn hold(&self, key: &str) -> Arc<Notify> {
        Arc::clone(
            self.gates
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_default(),
        )
    }

    async fn pass(&self, key: &str) {
        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

// ── Scanner ─────────────────────────────────────────────────────────────────

/// Gate key is `scan`.
#[derive(Default)]
pub struct FakeScanner {
    records: Mutex<Vec<SkillRecord>>,
    failing: AtomicBool,
    scans: AtomicUsize,
    pub gates: Gates,
}

impl FakeScanner {
    pub fn set(&self, records: Vec<SkillRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn add(&self, record: SkillRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn remove_paths(&self, paths: &[PathBuf]) {
        self.records
            .lock()
            .unwrap()
            .retain(|r| !paths.contains(&r.path));
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SkillScanner for FakeScanner {
    async fn scan(&self) -> anyhow::Result<Vec<SkillRecord>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.gates.pass("scan").await;
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("permission denied reading skills directory");
        }
        Ok(self.records.lock().unwrap().clone())
    }
}

// ── Marketplace ─────────────────────────────────────────────────────────────

/// Pages and searches answer from canned data. Gate keys are `page:<n>` and
/// `search:<query>`.
#[derive(Default)]
pub struct FakeMarketplace {
    pages: Mutex<HashMap<u32, marketplace::Result<Vec<MarketplaceRecord>>>>,
    searches: Mutex<HashMap<String, marketplace::Result<Vec<MarketplaceRecord>>>>,
    calls: Mutex<Vec<String>>,
    pub gates: Gates,
}

impl FakeMarketplace {
    pub fn set_page(&self, page: u32, records: Vec<MarketplaceRecord>) {
        self.pages.lock().unwrap().insert(page, Ok(records));
    }

    pub fn fail_page(&self, page: u32) {
        self.pages.lock().unwrap().insert(
            page,
            Err(marketplace::Error::Network("connection refused".into())),
        );
    }

    pub fn set_search(&self, query: &str, records: Vec<MarketplaceRecord>) {
        self.searches
            .lock()
            .unwrap()
            .insert(query.to_string(), Ok(records));
    }

    pub fn fail_search(&self, query: &str) {
        self.searches.lock().unwrap().insert(
            query.to_string(),
            Err(marketplace::Error::Status {
                status: 503,
                body: "unavailable".into(),
            }),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

#[async_trait]
impl MarketplaceClient for FakeMarketplace {
    async fn fetch_page(&self, page: u32) -> marketplace::Result<Vec<MarketplaceRecord>> {
        let key = format!("page:{page}");
        self.calls.lock().unwrap().push(key.clone());
        self.gates.pass(&key).await;
        self.pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search(&self, query: &str, _limit: usize) -> marketplace::Result<Vec<MarketplaceRecord>> {
        let key = format!("search:{query}");
        self.calls.lock().unwrap().push(key.clone());
        self.gates.pass(&key).await;
        self.searches
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ── Installer ───────────────────────────────────────────────────────────────

/// Adds `adds` to the scanner's inventory when it succeeds.
pub struct FakeInstaller {
    scanner: Arc<FakeScanner>,
    adds: Mutex<Vec<SkillRecord>>,
    output: Mutex<CommandOutput>,
    requests: Mutex<Vec<InstallRequest>>,
}

impl FakeInstaller {
    fn new(scanner: Arc<FakeScanner>) -> Self {
        Self {
            scanner,
            adds: Mutex::default(),
            output: Mutex::new(CommandOutput {
                success: true,
                stdout: "Installed".into(),
                stderr: String::new(),
            }),
            requests: Mutex::default(),
        }
    }

    pub fn on_success_add(&self, records: Vec<SkillRecord>) {
        *self.adds.lock().unwrap() = records;
    }

    pub fn fail_with(&self, stderr: &str) {
        *self.output.lock().unwrap() = CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        };
    }

    pub fn requests(&self) -> Vec<InstallRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Installer for FakeInstaller {
    async fn install(&self, request: &InstallRequest) -> anyhow::Result<CommandOutput> {
        self.requests.lock().unwrap().push(request.clone());
        let output = self.output.lock().unwrap().clone();
        if output.success {
            for record in self.adds.lock().unwrap().iter() {
                self.scanner.add(record.clone());
            }
        }
        Ok(output)
    }
}

// ── Remover ─────────────────────────────────────────────────────────────────

pub struct FakeRemover {
    scanner: Arc<FakeScanner>,
    calls: Mutex<Vec<(Vec<PathBuf>, Vec<PathBuf>)>>,
}

impl FakeRemover {
    pub fn calls(&self) -> Vec<(Vec<PathBuf>, Vec<PathBuf>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SkillRemover for FakeRemover {
    async fn remove(
        &self,
        targets: Vec<PathBuf>,
        survivors: Vec<PathBuf>,
    ) -> anyhow::Result<RemovalReport> {
        self.scanner.remove_paths(&targets);
        self.calls
            .lock()
            .unwrap()
            .push((targets.clone(), survivors));
        Ok(RemovalReport {
            removed: targets,
            shared_removed: Vec::new(),
        })
    }
}

// ── Updates ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeUpdates {
    flags: Mutex<HashMap<String, bool>>,
    checks: AtomicUsize,
    updates: AtomicUsize,
    pub gates: Gates,
}

impl FakeUpdates {
    pub fn set_outdated(&self, names: &[&str]) {
        *self.flags.lock().unwrap() = names.iter().map(|n| (n.to_string(), true)).collect();
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateChecker for FakeUpdates {
    async fn check(&self, names: &[String]) -> anyhow::Result<HashMap<String, bool>> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.gates.pass("check").await;
        let flags = self.flags.lock().unwrap();
        Ok(names
            .iter()
            .map(|n| (n.clone(), flags.get(n).copied().unwrap_or(false)))
            .collect())
    }

    async fn update_all(&self) -> anyhow::Result<CommandOutput> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.gates.pass("update").await;
        self.flags.lock().unwrap().clear();
        Ok(CommandOutput {
            success: true,
            ..Default::default()
        })
    }
}

// ── Host ────────────────────────────────────────────────────────────────────

pub struct FakeHost {
    choices: Mutex<Option<InstallChoices>>,
    delete_scope: Mutex<Option<DeleteScope>>,
    prompts: Mutex<Vec<InstallPrompt>>,
    delete_prompts: AtomicUsize,
    notices: Mutex<Vec<Notice>>,
    opened: Mutex<Vec<String>>,
    open_fails: AtomicBool,
    pub gates: Gates,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            choices: Mutex::new(Some(InstallChoices {
                scope: Level::Project,
                agents: vec![AgentMode::ClaudeCode],
                method: InstallMethod::Symlink,
                telemetry: false,
            })),
            delete_scope: Mutex::new(Some(DeleteScope::Selected)),
            prompts: Mutex::default(),
            delete_prompts: AtomicUsize::new(0),
            notices: Mutex::default(),
            opened: Mutex::default(),
            open_fails: AtomicBool::new(false),
            gates: Gates::default(),
        }
    }
}

impl FakeHost {
    pub fn set_choices(&self, choices: Option<InstallChoices>) {
        *self.choices.lock().unwrap() = choices;
    }

    pub fn set_delete_scope(&self, scope: Option<DeleteScope>) {
        *self.delete_scope.lock().unwrap() = scope;
    }

    pub fn fail_open(&self) {
        self.open_fails.store(true, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<InstallPrompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn delete_prompts(&self) -> usize {
        self.delete_prompts.load(Ordering::SeqCst)
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for FakeHost {
    async fn pick_install_options(&self, prompt: &InstallPrompt) -> Option<InstallChoices> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.gates.pass("wizard").await;
        self.choices.lock().unwrap().clone()
    }

    async fn choose_delete_scope(
        &self,
        _selected: &SkillRecord,
        _installations: &[SkillRecord],
    ) -> Option<DeleteScope> {
        self.delete_prompts.fetch_add(1, Ordering::SeqCst);
        *self.delete_scope.lock().unwrap()
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    async fn open_path(&self, path: &Path) -> anyhow::Result<()> {
        if self.open_fails.load(Ordering::SeqCst) {
            anyhow::bail!("no application registered");
        }
        self.opened.lock().unwrap().push(path.display().to_string());
        Ok(())
    }

    async fn open_url(&self, url: &str) -> anyhow::Result<()> {
        if self.open_fails.load(Ordering::SeqCst) {
            anyhow::bail!("no browser");
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

// ── Harness ─────────────────────────────────────────────────────────────────

pub struct Harness {
    pub scanner: Arc<FakeScanner>,
    pub marketplace: Arc<FakeMarketplace>,
    pub installer: Arc<FakeInstaller>,
    pub remover: Arc<FakeRemover>,
    pub updates: Arc<FakeUpdates>,
    pub host: Arc<FakeHost>,
    pub cache: Arc<MemoryCacheStore>,
}

impl Harness {
    pub fn new() -> Self {
        let scanner = Arc::new(FakeScanner::default());
        Self {
            installer: Arc::new(FakeInstaller::new(Arc::clone(&scanner))),
            remover: Arc::new(FakeRemover {
                scanner: Arc::clone(&scanner),
                calls: Mutex::default(),
            }),
            scanner,
            marketplace: Arc::new(FakeMarketplace::default()),
            updates: Arc::new(FakeUpdates::default()),
            host: Arc::new(FakeHost::default()),
            cache: Arc::new(MemoryCacheStore::new()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            scanner: self.scanner.clone(),
            marketplace: self.marketplace.clone(),
            installer: self.installer.clone(),
            remover: self.remover.clone(),
            updates: Some(self.updates.clone()),
            cache: self.cache.clone(),
            host: self.host.clone(),
        }
    }

    pub fn start(&self) -> SidebarHandle {
        Coordinator::spawn(self.services(), config())
    }
}

pub fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        cache_ttl: Duration::from_secs(300),
        search_debounce: Duration::from_millis(150),
        search_limit: 20,
    }
}

// ── Waiting ─────────────────────────────────────────────────────────────────

/// Wait for a snapshot matching `predicate`.
pub async fn settle(
    handle: &SidebarHandle,
    predicate: impl FnMut(&ViewSnapshot) -> bool,
) -> ViewSnapshot {
    tokio::time::timeout(Duration::from_secs(30), handle.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("coordinator stopped")
}

/// Poll until `condition` holds.
pub async fn until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(30), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

/// Let every runnable task (the coordinator included) drain. With a paused
/// clock the sleep only completes once the runtime is idle.
pub async fn idle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Initial activation finished: first scan applied and page 0 answered.
pub async fn activated(handle: &SidebarHandle) -> ViewSnapshot {
    settle(handle, |s| s.revision > 0 && !s.is_scanning && !s.is_loading_marketplace).await
}
