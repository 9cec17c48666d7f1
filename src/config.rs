use std::path::PathBuf;
use std::time::Duration;

use crate::cli::LibraryArgs;
use crate::selection::DEFAULT_PREVIEW_LIMIT;

/// File name of the selection database inside the state directory.
pub const DB_FILE_NAME: &str = "selection.db";

const DEFAULT_WATCH_INTERVAL_SECS: u64 = 300;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub library_dir: PathBuf,
    pub state_dir: PathBuf,
    pub preview_limit: usize,
    pub watch_interval: Duration,
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Config {
    pub fn from_library_args(args: &LibraryArgs) -> anyhow::Result<Self> {
        if args.library.trim().is_empty() {
            anyhow::bail!("--library must not be empty");
        }
        if args.state_dir.trim().is_empty() {
            anyhow::bail!("--state-dir must not be empty");
        }

        Ok(Self {
            library_dir: expand_tilde(&args.library),
            state_dir: expand_tilde(&args.state_dir),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            watch_interval: Duration::from_secs(DEFAULT_WATCH_INTERVAL_SECS),
        })
    }

    pub fn with_preview_limit(mut self, limit: usize) -> anyhow::Result<Self> {
        if limit == 0 {
            anyhow::bail!("--limit must be at least 1");
        }
        self.preview_limit = limit;
        Ok(self)
    }

    pub fn with_watch_interval(mut self, secs: u64) -> anyhow::Result<Self> {
        if secs == 0 {
            anyhow::bail!("--interval must be at least 1 second");
        }
        self.watch_interval = Duration::from_secs(secs);
        Ok(self)
    }

    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join(DB_FILE_NAME)
    }
}
