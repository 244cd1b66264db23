use crate::{
    commands::Commands,
    error::CliError,
    fixture::Fixture,
    output::{StatusReport, SyncReport},
    shutdown::Interrupts,
};
use clap::Parser;
use model::{
    core::identifiers::CollectionKey,
    request::{PageMode, SyncRequest},
};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};
use sync_core::{
    cache::{PageCache, sled_cache::SledCache},
    clock::SystemClock,
    retry::RetryPolicy,
    state::{LastRequestTracker, PageCursor, SyncStateStore, sled_store::SledSyncState},
};
use sync_runtime::{EnrichmentPolicy, SyncBuilder, SyncContext, SyncSettings};
use tokio::runtime::Handle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod fixture;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "pagesync",
    version = "0.1.0",
    about = "Incremental collection sync"
)]
struct Cli {
    #[arg(long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let interrupts = Interrupts::new();
    interrupts.listen();

    match run(cli.command, &interrupts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ShutdownRequested) => {
            info!("Sync cancelled by signal");
            interrupts.exit_code()
        }
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, interrupts: &Interrupts) -> Result<(), CliError> {
    match command {
        Commands::Sync {
            state_dir,
            fixture,
            collection,
            refresh,
            force,
            best_effort,
            concurrency,
            settings,
            json,
        } => {
            let mut sync_settings = load_settings(settings.as_deref()).await?;
            if best_effort {
                sync_settings = sync_settings.with_policy(EnrichmentPolicy::BestEffort);
            }
            if let Some(limit) = concurrency {
                sync_settings = sync_settings.with_max_concurrent_enrichments(limit);
            }

            let mode = if refresh {
                PageMode::Refresh
            } else {
                PageMode::NextPage
            };
            let job = SyncJob {
                state_dir,
                fixture,
                collection,
                request: SyncRequest::new(mode, force),
                settings: sync_settings,
            };

            let report = run_sync(job, interrupts).await?;
            if json {
                output::print_json(&report)?;
            } else {
                output::print_sync_table(&report);
            }
        }
        Commands::Status {
            state_dir,
            collection,
            settings,
            json,
        } => {
            let sync_settings = load_settings(settings.as_deref()).await?;
            let status = collect_status(&state_dir, &collection, &sync_settings)?;
            if json {
                output::print_json(&status)?;
            } else {
                output::print_status_table(&status);
            }
        }
    }

    Ok(())
}

struct SyncJob {
    state_dir: PathBuf,
    fixture: PathBuf,
    collection: String,
    request: SyncRequest,
    settings: SyncSettings,
}

async fn run_sync(job: SyncJob, interrupts: &Interrupts) -> Result<SyncReport, CliError> {
    let fixture = Fixture::load(&job.fixture).await?;
    let (source, fetchers) = fixture.into_remote();
    let stores = LocalStores::open(&job.state_dir)?;

    let context = SyncContext::new(Handle::current(), interrupts.scope());
    let orchestrator = SyncBuilder::new(
        job.collection.as_str(),
        stores.state.clone(),
        stores.cache.clone(),
        stores.cache.clone(),
    )
    .with_retry(RetryPolicy::for_network())
    .with_settings(job.settings)
    .build(source, fetchers, context);

    match orchestrator.synchronize(job.request).await {
        Ok(outcome) => Ok(SyncReport::new(
            outcome,
            orchestrator.metrics().snapshot(),
        )),
        Err(err) if err.is_cancelled() && interrupts.interrupted() => {
            Err(CliError::ShutdownRequested)
        }
        Err(err) => Err(err.into()),
    }
}

fn collect_status(
    state_dir: &Path,
    collection: &str,
    settings: &SyncSettings,
) -> Result<StatusReport, CliError> {
    let stores = LocalStores::open(state_dir)?;
    let key = CollectionKey::from(collection);
    let state: Arc<dyn SyncStateStore> = stores.state.clone();

    let cursor = PageCursor::new(state.clone(), key.clone());
    let tracker = LastRequestTracker::new(state, key.clone(), Arc::new(SystemClock));

    Ok(StatusReport {
        collection: collection.to_string(),
        last_page: cursor.get_last_page()?,
        last_refresh: tracker.last_refresh()?,
        refresh_expired: tracker.is_expired(settings.refresh_max_age),
        cached_pages: stores.cache.page_count(&key)?,
    })
}

async fn load_settings(path: Option<&Path>) -> Result<SyncSettings, CliError> {
    let Some(path) = path else {
        return Ok(SyncSettings::default());
    };
    let source = tokio::fs::read_to_string(path).await?;
    SyncSettings::from_json(&source).map_err(|source| CliError::Parse {
        what: "settings",
        source,
    })
}

/// Sync state and caches sharing one sled database under `--state-dir`.
struct LocalStores {
    state: Arc<SledSyncState>,
    cache: Arc<SledCache>,
}

impl LocalStores {
    fn open(dir: &Path) -> Result<Self, CliError> {
        let db = sled::open(dir)?;
        Ok(Self {
            state: Arc::new(SledSyncState::from_db(db.clone())),
            cache: Arc::new(SledCache::new(&db)?),
        })
    }
}
