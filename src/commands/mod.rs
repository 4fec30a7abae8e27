// ABOUTME: Run invocation surface for backup and restore
// ABOUTME: Takes an immutable RunConfig and a connected store, returns a RunOutcome

pub mod backup;
pub mod restore;

pub use backup::backup;
pub use restore::restore;

use crate::config::DEFAULT_PROGRESS_INTERVAL;
use crate::migration::RunOutcome;
use crate::store::TableStore;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Backup,
    Restore,
}

/// Everything one run needs besides the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    pub table_name: String,
    pub file_path: PathBuf,
    /// Replace an existing backup file. Ignored by restore.
    pub overwrite_existing: bool,
    pub progress_interval: u64,
    pub show_progress: bool,
}

impl RunConfig {
    pub fn new(mode: Mode, table_name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            table_name: table_name.into(),
            file_path: file_path.into(),
            overwrite_existing: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            show_progress: false,
        }
    }

    pub fn backup(table_name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self::new(Mode::Backup, table_name, file_path)
    }

    pub fn restore(table_name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self::new(Mode::Restore, table_name, file_path)
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Run one backup or restore to completion
///
/// Nothing survives between runs: the store handle and all state are scoped to
/// this call. A failed outcome is also logged at error level.
pub async fn run(store: &dyn TableStore, config: RunConfig) -> RunOutcome {
    let outcome = match config.mode {
        Mode::Backup => backup(store, &config).await,
        Mode::Restore => restore(store, &config).await,
    };

    match outcome.failure_reason() {
        None => tracing::info!(
            "✅ {:?} of table {} complete: {} records",
            config.mode,
            config.table_name,
            outcome.records_transferred()
        ),
        Some(reason) => {
            tracing::error!("{}", reason);
            if outcome.records_transferred() > 0 {
                tracing::error!(
                    "{} records were transferred before the failure and were not rolled back",
                    outcome.records_transferred()
                );
            }
        }
    }

    outcome
}
