//! Command-line arguments and their resolution to concrete paths.

use clap::{Parser, ValueEnum};
use eyre::{eyre, Result, WrapErr};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "taskplan";
const LOG_DIR_NAME: &str = "logs";

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Single SQLite database file
    Sqlite,
    /// Tab-separated `tasks.txt` and `lists.txt`
    File,
}

/// Personal task planner with weighted urgency ranking
#[derive(Debug, Parser)]
#[command(
    name = "taskplan",
    about = "Personal task planner with weighted urgency ranking",
    version
)]
pub struct Cli {
    /// Directory holding the planner data (default: platform data dir)
    #[arg(long, env = "TASKPLAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, env = "TASKPLAN_BACKEND", value_enum, default_value = "sqlite")]
    pub backend: Backend,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "TASKPLAN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rolling log files (default: <data-dir>/logs)
    #[arg(long, env = "TASKPLAN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Absolute data directory, falling back to the platform data dir.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| eyre!("cannot determine a data directory; pass --data-dir"))?
                .join(APP_DIR_NAME),
        };
        absolutize(dir)
    }

    /// Absolute log directory. Defaults to a `logs` folder in `data_dir`.
    pub fn resolve_log_dir(&self, data_dir: &Path) -> Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => absolutize(dir.clone()),
            None => Ok(data_dir.join(LOG_DIR_NAME)),
        }
    }
}

fn absolutize(dir: PathBuf) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().wrap_err("failed to read the current directory")?;
    Ok(cwd.join(dir))
}
