//! Append-only record of launched apps.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// File name of the activity log inside the data directory.
pub const LOG_FILE: &str = "activity.log";

/// Destination for "app opened" events.
pub trait ActivityLog: std::fmt::Debug {
    /// Record that `name` was opened at `at`.
    ///
    /// # Errors
    ///
    /// Returns error if the event could not be written.
    fn record(&self, name: &str, at: DateTime<Utc>) -> std::io::Result<()>;
}

/// Appends one line per event to a text file.
#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
}

impl FileLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log at the default file name inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LOG_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActivityLog for FileLog {
    fn record(&self, name: &str, at: DateTime<Utc>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}: Opened {name}", at.to_rfc3339())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl ActivityLog for NullLog {
    fn record(&self, _name: &str, _at: DateTime<Utc>) -> std::io::Result<()> {
        Ok(())
    }
}
