//! Starting resolved programs.
//!
//! The launcher decides between a plain and an elevated start; how either is
//! done belongs to a [`ProcessHost`].

mod host;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use host::SystemHost;

/// Why a launch failed.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The process could not be started.
    #[error("failed to start {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The user refused the elevation prompt.
    #[error("elevation declined for {}", .0.display())]
    ElevationDeclined(PathBuf),

    /// Elevated launches cannot be done here.
    #[error("elevation unavailable: {0}")]
    ElevationUnavailable(String),
}

/// Operating system capabilities needed to start programs.
pub trait ProcessHost {
    /// Start `path` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns error if the program could not be started.
    fn start_detached(&self, path: &Path) -> Result<(), LaunchError>;

    /// Start `path` with elevated privileges, prompting if needed.
    ///
    /// # Errors
    ///
    /// Returns error if elevation is refused or unsupported.
    fn start_elevated(&self, path: &Path) -> Result<(), LaunchError>;

    /// Whether this process already runs elevated.
    fn is_elevated(&self) -> bool;
}

/// Starts programs through a [`ProcessHost`].
pub struct Launcher {
    host: Box<dyn ProcessHost>,
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher").finish_non_exhaustive()
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new(Box::new(SystemHost))
    }
}

impl Launcher {
    #[must_use]
    pub fn new(host: Box<dyn ProcessHost>) -> Self {
        Self { host }
    }

    /// Start `path`, elevated when asked and not already elevated.
    ///
    /// An elevated start is attempted once; its result is final.
    ///
    /// # Errors
    ///
    /// Returns the host's failure.
    pub fn launch(&self, path: &Path, elevate: bool) -> Result<(), LaunchError> {
        let elevated = elevate && !self.host.is_elevated();
        let result = if elevated {
            self.host.start_elevated(path)
        } else {
            self.host.start_detached(path)
        };

        match &result {
            Ok(()) => tracing::info!(path = %path.display(), elevated, "launched"),
            Err(e) => tracing::warn!(path = %path.display(), elevated, error = %e, "launch failed"),
        }
        result
    }
}
