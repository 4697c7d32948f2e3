mod host;
mod transport;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    skilldeck_cache::JsonFileCacheStore,
    skilldeck_config::SkilldeckConfig,
    skilldeck_marketplace::HttpMarketplaceClient,
    skilldeck_sidebar::{Coordinator, CoordinatorConfig, DeleteScope, InstallChoices, Services},
    skilldeck_skills::{
        AgentMode, CliInstaller, CliUpdateChecker, FsSkillRemover, FsSkillScanner, InstallMethod,
        Level, SkillScanner, SkillsCli, home_dir, managed_dirs,
    },
    tokio::{io::BufReader, sync::mpsc},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::host::{DialogAnswers, StdioHost};

#[derive(Parser)]
#[command(name = "skilldeck", about = "Skilldeck: installed and marketplace skills, side by side")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/skilldeck/).
    #[arg(long, global = true, env = "SKILLDECK_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
    /// Custom data directory holding the sidebar cache.
    #[arg(long, global = true, env = "SKILLDECK_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Project root to scan for project-level skills (repeatable; overrides
    /// config, defaults to the current directory).
    #[arg(long = "workspace", global = true)]
    workspaces: Vec<PathBuf>,

    #[command(flatten)]
    answers: AnswerArgs,
}

/// Preset answers for the install wizard and the delete prompt.
#[derive(clap::Args)]
struct AnswerArgs {
    /// Install scope.
    #[arg(long, global = true, default_value = "project")]
    scope: Level,
    /// Agent to install for (repeatable).
    #[arg(long = "agent", global = true, default_values = ["claude-code"])]
    agents: Vec<AgentMode>,
    /// Install method: symlink or copy.
    #[arg(long, global = true, default_value = "symlink")]
    method: InstallMethod,
    /// Allow the installer to send anonymous telemetry.
    #[arg(long, global = true, default_value_t = false)]
    telemetry: bool,
    /// Delete every installation of a skill instead of only the selected one.
    #[arg(long, global = true, default_value_t = false)]
    delete_all: bool,
}

impl From<&AnswerArgs> for DialogAnswers {
    fn from(args: &AnswerArgs) -> Self {
        Self {
            install: InstallChoices {
                scope: args.scope,
                agents: args.agents.clone(),
                method: args.method,
                telemetry: args.telemetry,
            },
            delete_scope: if args.delete_all {
                DeleteScope::All
            } else {
                DeleteScope::Selected
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sidebar over stdio (default): intents in, snapshots out.
    Serve,
    /// Print the installed inventory as JSON and exit.
    Scan,
}

/// Logs always go to stderr; stdout belongs to the UI transport.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Directories the session operates on.
struct Roots {
    projects: Vec<PathBuf>,
    home: PathBuf,
}

impl Roots {
    fn resolve(cli: &Cli, config: &SkilldeckConfig) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine the current directory")?;
        let projects = if cli.workspaces.is_empty() {
            config.workspace.resolved_roots(cwd)
        } else {
            cli.workspaces.clone()
        };
        let home = home_dir().context("cannot determine the home directory")?;
        Ok(Self { projects, home })
    }

    /// Working directory for project-scope installs and update checks.
    fn primary(&self) -> PathBuf {
        self.projects
            .first()
            .cloned()
            .unwrap_or_else(|| self.home.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(ref dir) = cli.config_dir {
        skilldeck_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        skilldeck_config::set_data_dir(dir.clone());
    }
    let config = skilldeck_config::discover_and_load();
    let roots = Roots::resolve(&cli, &config)?;

    info!(version = env!("CARGO_PKG_VERSION"), roots = roots.projects.len(), "skilldeck starting");

    match cli.command {
        None | Some(Commands::Serve) => serve(&cli, &config, &roots).await,
        Some(Commands::Scan) => scan(&roots).await,
    }
}

async fn scan(roots: &Roots) -> anyhow::Result<()> {
    let records = FsSkillScanner::for_roots(&roots.projects, &roots.home)
        .scan()
        .await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn serve(cli: &Cli, config: &SkilldeckConfig, roots: &Roots) -> anyhow::Result<()> {
    let cache_path = skilldeck_config::cache_file_path();
    info!(path = %cache_path.display(), "using sidebar cache");

    let marketplace = HttpMarketplaceClient::new(
        &config.marketplace.base_url,
        config.marketplace.timeout(),
        &config.marketplace.user_agent,
    )?;
    let skills_cli = SkillsCli::new(config.installer.program.clone(), config.installer.args.clone());
    let scanner = FsSkillScanner::for_roots(&roots.projects, &roots.home);
    #[cfg(feature = "file-watcher")]
    let watched: Vec<PathBuf> = scanner.locations().iter().map(|l| l.dir.clone()).collect();

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let services = Services {
        scanner: Arc::new(scanner),
        marketplace: Arc::new(marketplace),
        installer: Arc::new(CliInstaller::new(skills_cli.clone(), roots.primary())),
        remover: Arc::new(FsSkillRemover::new(managed_dirs(&roots.projects, &roots.home))),
        updates: Some(Arc::new(CliUpdateChecker::new(skills_cli, Some(roots.primary())))),
        cache: Arc::new(JsonFileCacheStore::open(cache_path)),
        host: Arc::new(StdioHost::new(
            DialogAnswers::from(&cli.answers),
            outbound_tx.clone(),
        )),
    };

    let handle = Coordinator::spawn(services, CoordinatorConfig::from(config));
    let writer = tokio::spawn(transport::write_lines(outbound_rx, tokio::io::stdout()));
    tokio::spawn(transport::forward_snapshots(
        handle.subscribe(),
        outbound_tx.clone(),
    ));

    #[cfg(feature = "file-watcher")]
    let watcher = match watch_inventory(watched, handle.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "skill directory watcher unavailable");
            None
        },
    };

    let stdin = BufReader::new(tokio::io::stdin());
    transport::read_intents(stdin, handle, outbound_tx).await?;
    info!("input closed, shutting down");

    // The writer ends once the coordinator and its tasks release their senders.
    #[cfg(feature = "file-watcher")]
    drop(watcher);
    writer.await??;
    Ok(())
}

/// Forward filesystem changes to the coordinator as rescans. Dropping the
/// returned guard stops both the watcher and the forwarding task.
#[cfg(feature = "file-watcher")]
fn watch_inventory(
    dirs: Vec<PathBuf>,
    handle: skilldeck_sidebar::SidebarHandle,
) -> anyhow::Result<WatchGuard> {
    use skilldeck_sidebar::SidebarEvent;

    let (watcher, mut changes) =
        skilldeck_skills::watcher::SkillWatcher::start(dirs, std::time::Duration::from_millis(500))?;
    let task = tokio::spawn(async move {
        while changes.recv().await.is_some() {
            if handle.send(SidebarEvent::InventoryChanged).is_err() {
                break;
            }
        }
    });
    Ok(WatchGuard {
        _watcher: watcher,
        task,
    })
}

#[cfg(feature = "file-watcher")]
struct WatchGuard {
    _watcher: skilldeck_skills::watcher::SkillWatcher,
    task: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "file-watcher")]
impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
