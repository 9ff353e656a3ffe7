mod app_dirs;
mod cli;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod reports;
pub mod settings;
pub mod store;
pub mod timer;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use app_dirs::AppDirs;
use cli::{Cli, Command};
use db::Database;
use reports::Reports;
use settings::SettingsStore;
use store::SessionLog;
use timer::{SessionRecorder, TimerController};

pub(crate) struct AppState {
    pub(crate) log: SessionLog,
    pub(crate) timer: TimerController,
    pub(crate) reports: Reports,
    pub(crate) settings: SettingsStore,
}

impl AppState {
    fn open(dirs: &AppDirs) -> Result<Self> {
        let database = Database::new(dirs.db_path())?;
        let settings = SettingsStore::new(dirs.settings_path())?;

        let log = SessionLog::new(Arc::new(database));
        let timer = TimerController::new(
            SessionRecorder::new(log.clone()),
            settings.timer_defaults().initial_state(),
        );

        Ok(Self {
            reports: Reports::new(log.clone()),
            log,
            timer,
            settings,
        })
    }
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var). Stay quiet by default so
    // log lines don't interleave with the interactive prompt.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let dirs = AppDirs::resolve(cli.data_dir.clone());
    log::debug!("Using data directory {}", dirs.data_dir().display());

    let command = cli.command.unwrap_or(Command::Focus {
        minutes: None,
        category: None,
    });

    // Timer, lifecycle signals and user input all share one thread; each
    // transition runs to completion before the next event is handled.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let state = AppState::open(&dirs)?;
        cli::dispatch(state, command).await
    })
}
