//! Interactive task planner entry point.
//!
//! # Responsibility
//! - Resolve data/log locations from flags and environment.
//! - Open the selected backend and hand the planner to the prompt loop.

mod cli;
mod render;
mod repl;

use clap::Parser;
use cli::{Backend, Cli};
use eyre::{eyre, Result, WrapErr};
use log::info;
use std::fs;
use std::path::Path;
use taskplan_core::db::DB_FILE_NAME;
use taskplan_core::{
    default_log_level, init_logging, FileTaskStore, Planner, SqliteTaskStore, TaskStore,
};

type DynPlanner = Planner<Box<dyn TaskStore + Send>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.resolve_data_dir()?;
    fs::create_dir_all(&data_dir)
        .wrap_err_with(|| format!("failed to create data directory {}", data_dir.display()))?;

    let log_dir = cli.resolve_log_dir(&data_dir)?;
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &log_dir).map_err(|err| eyre!("failed to initialize logging: {err}"))?;
    info!(
        "event=cli_start module=cli status=ok backend={:?} data_dir={}",
        cli.backend,
        data_dir.display()
    );

    let mut planner = open_planner(cli.backend, &data_dir)?;
    repl::run(&mut planner)
}

fn open_planner(backend: Backend, data_dir: &Path) -> Result<DynPlanner> {
    let store: Box<dyn TaskStore + Send> = match backend {
        Backend::Sqlite => Box::new(
            SqliteTaskStore::open(data_dir.join(DB_FILE_NAME))
                .map_err(|err| eyre!("failed to open database: {err}"))?,
        ),
        Backend::File => Box::new(
            FileTaskStore::open(data_dir)
                .map_err(|err| eyre!("failed to open task files: {err}"))?,
        ),
    };
    Planner::open(store).map_err(|err| eyre!("failed to load lists: {err}"))
}
