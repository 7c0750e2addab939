//! Filesystem-backed JSON tables for learned apps and routines.
//!
//! Every table lives in its own `.json` file under the storage root and is
//! always read and rewritten as a whole. Writes go to a temporary file in the
//! same directory which is then renamed over the target, so a crash mid-write
//! leaves the previous table readable.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The temporary file could not be renamed over the target.
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },
}

/// Storage result type.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Outcome of writing a mutated table back to disk.
///
/// A failed write never rolls back the in-memory change; the caller decides
/// how loudly to surface it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Persistence {
    /// The table was written.
    Saved,
    /// The table could not be written; the reason is human-readable.
    Failed(String),
}

impl Persistence {
    /// Convert a write result, logging failures.
    pub fn from_result(table: &str, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Saved,
            Err(e) => {
                tracing::warn!(table, error = %e, "failed to persist table");
                Self::Failed(e.to_string())
            }
        }
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Saved => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// Storage backend for persisting tables.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a new storage instance at the default location.
    ///
    /// # Errors
    ///
    /// Returns error if data directory cannot be determined.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::with_root(Config::data_dir()?))
    }

    /// Create a storage instance at a custom location.
    #[must_use]
    pub const fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Get the storage root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a path from key segments.
    #[must_use]
    pub fn path(&self, key: &[&str]) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key {
            path.push(segment);
        }
        path.set_extension("json");
        path
    }

    /// Read a value from storage.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or cannot be parsed.
    pub fn read<T>(&self, key: &[&str]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let path = self.path(key);

        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(&path)?;
        let value: T = serde_json::from_str(&contents)?;
        Ok(value)
    }

    /// Write a value to storage, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written or renamed into place.
    pub fn write<T>(&self, key: &[&str], value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path(key);
        let parent = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(value)?;

        let mut file = tempfile::NamedTempFile::new_in(parent)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| StorageError::Persist {
            path: path.display().to_string(),
            source: e.error,
        })?;

        tracing::debug!(path = %path.display(), "wrote table");
        Ok(())
    }
}
