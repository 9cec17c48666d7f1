//! photon-sync — choose which local photos and videos to sync.
//!
//! The selection (a set of media ids plus a "sync all" flag) lives in a small
//! SQLite key-value store. Every time the app starts or is resumed, the stored
//! ids are reconciled against the media library so deleted media drop out of
//! the selection and, under sync-all, new media join it.

#![warn(clippy::all)]

mod cli;
mod config;
mod lifecycle;
mod media;
mod selection;
mod shutdown;
mod store;
mod types;

use std::collections::BTreeSet;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Command;
use config::Config;
use media::{FsMediaLibrary, MediaLibrary, PermissionStatus};
use selection::{ReconcileOutcome, Reconciler, SelectionDraft, SelectionStore};
use store::{KeyValueStore, SqliteKvStore};
use types::MediaKind;

/// Everything a command needs, opened from the resolved config.
struct App {
    config: Config,
    library: Arc<FsMediaLibrary>,
    kv: Arc<SqliteKvStore>,
    selection: SelectionStore,
}

impl App {
    async fn open(config: Config) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.state_dir).await?;
        let kv = Arc::new(SqliteKvStore::open(&config.db_path()).await?);
        tracing::debug!("Selection database opened at {}", config.db_path().display());

        let library = Arc::new(FsMediaLibrary::new(config.library_dir.clone()));
        let selection = SelectionStore::new(kv.clone() as Arc<dyn KeyValueStore>);
        Ok(Self {
            config,
            library,
            kv,
            selection,
        })
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.library.clone() as Arc<dyn MediaLibrary>,
            self.selection.clone(),
        )
    }

    async fn require_permission(&self) -> anyhow::Result<()> {
        let status = self.library.permission_status().await;
        if !status.is_granted() {
            anyhow::bail!(
                "photon-sync needs access to your media library at {} (permission {}).\n\
                 Run `photon-sync init` to set it up.",
                self.config.library_dir.display(),
                status.as_str()
            );
        }
        Ok(())
    }

    async fn require_explicit_mode(&self) -> anyhow::Result<()> {
        if self.selection.get_sync_all().await {
            anyhow::bail!(
                "All media will be synced. Run `photon-sync sync-all off` to edit the selection."
            );
        }
        Ok(())
    }
}

fn print_reconciliation(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::NoSelection => {
            println!("No selection saved yet, nothing to reconcile.");
        }
        ReconcileOutcome::Reconciled(r) => {
            println!("Selected media: {}", r.ids.len());
            println!("  Removed (deleted from library): {}", r.removed);
            if r.sync_all {
                println!("  Added (sync all):               {}", r.added);
            }
            if !r.persisted {
                println!("  Warning: the corrected selection could not be saved");
            }
        }
    }
}

/// Run the init command.
async fn run_init(app: App) -> anyhow::Result<()> {
    let status = app.library.permission_status().await;
    if status.is_granted() {
        println!(
            "Access to {} already granted.",
            app.config.library_dir.display()
        );
        return Ok(());
    }

    println!("photon-sync needs access to your media library to sync media.");
    let status = app.library.request_permission().await?;
    match status {
        PermissionStatus::Granted => {
            println!("Access granted to {}.", app.config.library_dir.display());
            Ok(())
        }
        other => anyhow::bail!(
            "Access to {} was not granted (permission {})",
            app.config.library_dir.display(),
            other.as_str()
        ),
    }
}

/// Run the status command.
async fn run_status(app: App) -> anyhow::Result<()> {
    let permission = app.library.permission_status().await;
    let stored = app.selection.get_selected_ids().await;
    let sync_all = app.selection.get_sync_all().await;

    println!("Selection database: {}", app.kv.path().display());
    println!("Media library:      {}", app.library.root().display());
    println!("Permission:         {}", permission.as_str());
    println!();
    println!("Sync all:           {}", if sync_all { "on" } else { "off" });
    match &stored {
        Some(ids) => println!("Selected media:     {}", ids.len()),
        None => println!("Selected media:     none saved"),
    }
    match app.kv.updated_at(selection::keys::SELECTED_MEDIA) {
        Ok(Some(at)) => println!(
            "Last saved:         {}",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read selection timestamp"),
    }

    if !permission.is_granted() {
        return Ok(());
    }

    let assets = app.library.enumerate(&MediaKind::ALL).await?;
    let photos = assets.iter().filter(|a| a.kind == MediaKind::Photo).count();
    let videos = assets.len() - photos;
    println!();
    println!("Library:");
    println!("  Photos: {}", photos);
    println!("  Videos: {}", videos);

    if let Some(ids) = stored {
        let live: BTreeSet<&str> = assets.iter().map(|a| a.id.as_str()).collect();
        let stale = ids.iter().filter(|id| !live.contains(id.as_str())).count();
        if stale > 0 {
            println!();
            println!(
                "{} selected media no longer exist; run `photon-sync reconcile` to drop them.",
                stale
            );
        }
    }

    Ok(())
}

/// Run the preview command.
async fn run_preview(app: App, json: bool) -> anyhow::Result<()> {
    app.require_permission().await?;

    let items = selection::preview(
        &*app.library,
        &app.selection,
        app.config.preview_limit,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if app.selection.get_sync_all().await {
        println!("All media will be synced.");
        println!();
    }
    for item in &items {
        println!(
            "[{}] {} ({})",
            if item.is_selected { "x" } else { " " },
            item.id,
            item.kind
        );
    }
    if items.is_empty() {
        println!("No photos or videos found.");
    }

    Ok(())
}

/// Run the select and deselect commands.
async fn run_edit(app: App, ids: Vec<String>, selected: bool) -> anyhow::Result<()> {
    app.require_permission().await?;
    app.require_explicit_mode().await?;

    let mut draft = SelectionDraft::load(&*app.library, &app.selection).await?;
    let mut unknown = 0;
    for id in &ids {
        if !draft.set(id, selected) {
            tracing::warn!(id = %id, "Not in the media library, skipping");
            unknown += 1;
        }
    }
    if unknown == ids.len() {
        anyhow::bail!("None of the given media exist in the library");
    }

    let saved = draft.save(&app.selection).await?;
    println!("Selected media: {} of {}", saved.len(), draft.len());
    Ok(())
}

/// Run the toggle command.
async fn run_toggle(app: App, ids: Vec<String>) -> anyhow::Result<()> {
    app.require_permission().await?;
    app.require_explicit_mode().await?;

    let mut draft = SelectionDraft::load(&*app.library, &app.selection).await?;
    for id in &ids {
        match draft.toggle(id) {
            Some(_) => println!("[{}] {}", if draft.is_selected(id) { "x" } else { " " }, id),
            None => tracing::warn!(id = %id, "Not in the media library, skipping"),
        }
    }

    let saved = draft.save(&app.selection).await?;
    println!("Selected media: {} of {}", saved.len(), draft.len());
    Ok(())
}

/// Run the save command.
async fn run_save(app: App, ids: Vec<String>) -> anyhow::Result<()> {
    app.require_permission().await?;
    app.require_explicit_mode().await?;

    let mut draft = SelectionDraft::load(&*app.library, &app.selection).await?;
    if draft.is_empty() {
        println!("No photos or videos found in the library.");
    }
    for id in draft.select_only(ids.iter().map(String::as_str)) {
        tracing::warn!(id = %id, "Not in the media library, skipping");
    }

    let saved = draft.save(&app.selection).await?;
    println!("Selected media: {} of {}", saved.len(), draft.len());
    Ok(())
}

/// Run the sync-all command.
async fn run_sync_all(app: App, enabled: bool) -> anyhow::Result<()> {
    if !enabled {
        app.selection.set_sync_all(false).await?;
        println!("Sync all turned off; the saved selection applies again.");
        return Ok(());
    }

    app.require_permission().await?;
    if app.selection.enable_sync_all().await? {
        tracing::debug!("Seeded an empty selection for sync-all");
    }

    println!("Sync all turned on.");
    let outcome = app.reconciler().reconcile().await?;
    print_reconciliation(&outcome);
    Ok(())
}

/// Run the reconcile command.
async fn run_reconcile(app: App) -> anyhow::Result<()> {
    app.require_permission().await?;
    let outcome = app.reconciler().reconcile().await?;
    print_reconciliation(&outcome);
    Ok(())
}

/// Run the watch command.
async fn run_watch(app: App) -> anyhow::Result<()> {
    app.require_permission().await?;

    let shutdown_token = shutdown::install_signal_handler()?;
    let monitor = Arc::new(lifecycle::AppStateMonitor::new(lifecycle::AppState::Active));
    let subscription = monitor.subscribe();

    let timer = lifecycle::spawn_wake_timer(
        monitor.clone(),
        app.config.watch_interval,
        shutdown_token.clone(),
    );
    #[cfg(unix)]
    let resume_signal = lifecycle::spawn_resume_signal(monitor.clone(), shutdown_token.clone())?;

    tracing::info!(
        library = %app.config.library_dir.display(),
        interval_secs = app.config.watch_interval.as_secs(),
        "Watching media library (send SIGUSR1 to reconcile now)"
    );

    let passes =
        lifecycle::run_foreground_reconciler(app.reconciler(), subscription, shutdown_token.clone())
            .await;

    shutdown_token.cancel();
    timer.await?;
    #[cfg(unix)]
    resume_signal.await?;

    tracing::info!(passes, "Stopped watching");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = Config::from_library_args(cli.command.library_args())?;
    let config = match &cli.command {
        Command::Preview(args) => config.with_preview_limit(args.limit)?,
        Command::Watch(args) => config.with_watch_interval(args.interval)?,
        _ => config,
    };
    let app = App::open(config).await?;

    match cli.command {
        Command::Init(_) => run_init(app).await,
        Command::Status(_) => run_status(app).await,
        Command::Preview(args) => run_preview(app, args.json).await,
        Command::Select(args) => run_edit(app, args.ids, true).await,
        Command::Deselect(args) => run_edit(app, args.ids, false).await,
        Command::Toggle(args) => run_toggle(app, args.ids).await,
        Command::Save(args) => run_save(app, args.ids).await,
        Command::SyncAll(args) => run_sync_all(app, args.value.is_on()).await,
        Command::Reconcile(_) => run_reconcile(app).await,
        Command::Watch(_) => run_watch(app).await,
    }
}
