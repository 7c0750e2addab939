//! Opening an app by name: resolve, launch, remember, log.
//!
//! Used both for single commands and for every routine step.

use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;

use crate::config::Config;
use crate::core::activity::{ActivityLog, FileLog, NullLog};
use crate::core::launcher::{Launcher, ProcessHost};
use crate::core::learned::{AppRecord, LearnedAppStore};
use crate::core::normalize_name;
use crate::core::resolver::{Disambiguator, NameResolver, Resolution};
use crate::core::security;
use crate::core::storage::{Persistence, Storage};

/// Name shown by pickers before anything is chosen; never a real app.
pub const PLACEHOLDER: &str = "select app";

/// Whether `name` is blank or the picker placeholder.
#[must_use]
pub fn is_placeholder(name: &str) -> bool {
    let name = normalize_name(name);
    name.is_empty() || name == PLACEHOLDER
}

/// Why an app was not opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("no app name given")]
    Rejected,

    #[error("blocked command: {0}")]
    Blocked(String),

    #[error("not found")]
    NotFound,

    /// Several matches and no valid selection; reported like a miss.
    #[error("not found (no candidate selected)")]
    Ambiguous,

    #[error("{0}")]
    Launch(String),

    #[error("aborted")]
    Aborted,
}

/// A successful open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    /// Effective name, after fuzzy correction.
    pub name: String,
    pub path: PathBuf,
    /// Admin flag the app was launched with.
    pub elevated: bool,
    /// Set when the learned table could not be saved.
    pub persist_warning: Option<String>,
}

/// Result of [`AppOpener::open`].
pub type OpenOutcome = Result<Opened, Failure>;

/// Resolves, launches and learns apps.
#[derive(Debug)]
pub struct AppOpener {
    resolver: NameResolver,
    launcher: Launcher,
    learned: LearnedAppStore,
    activity: Box<dyn ActivityLog>,
    blocked: Vec<String>,
}

impl AppOpener {
    #[must_use]
    pub fn new(
        resolver: NameResolver,
        launcher: Launcher,
        learned: LearnedAppStore,
        activity: Box<dyn ActivityLog>,
    ) -> Self {
        Self {
            resolver,
            launcher,
            learned,
            activity,
            blocked: Vec::new(),
        }
    }

    /// Wire an opener from configuration, reading learned apps from `storage`.
    #[must_use]
    pub fn from_config(
        config: &Config,
        storage: Storage,
        chooser: Box<dyn Disambiguator>,
        host: Box<dyn ProcessHost>,
    ) -> Self {
        let activity: Box<dyn ActivityLog> = if config.activity.enabled {
            Box::new(FileLog::in_dir(storage.root()))
        } else {
            Box::new(NullLog)
        };

        Self::new(
            NameResolver::new(&config.search, chooser),
            Launcher::new(host),
            LearnedAppStore::load(storage),
            activity,
        )
        .with_blocked(config.security.blocked.clone())
    }

    /// Refuse names containing any of `blocked`.
    #[must_use]
    pub fn with_blocked(mut self, blocked: Vec<String>) -> Self {
        self.blocked = blocked;
        self
    }

    #[must_use]
    pub fn learned(&self) -> &LearnedAppStore {
        &self.learned
    }

    /// Resolve without launching anything.
    pub fn resolve(&mut self, name: &str) -> Resolution {
        self.resolver.resolve(name, &self.learned)
    }

    /// Open `name`, elevated if `admin` or if the app is known to need it.
    ///
    /// A system command's own admin flag replaces both. On success the app is
    /// remembered with the flag it actually ran with; failing to save that is
    /// only a warning.
    pub fn open(&mut self, name: &str, admin: bool) -> OpenOutcome {
        if is_placeholder(name) {
            return Err(Failure::Rejected);
        }
        if let Some(phrase) = security::blocked_phrase(name, &self.blocked) {
            tracing::warn!(name, phrase, "refusing blocked app name");
            return Err(Failure::Blocked(phrase.to_string()));
        }

        let resolution = self.resolver.resolve(name, &self.learned);
        let Some(path) = resolution.path.clone() else {
            return Err(if resolution.ambiguous {
                Failure::Ambiguous
            } else {
                Failure::NotFound
            });
        };

        let system = resolution.is_system_command();
        let elevated = if system {
            resolution.requires_admin
        } else {
            admin || resolution.requires_admin
        };

        self.launcher
            .launch(&path, elevated)
            .map_err(|e| Failure::Launch(e.to_string()))?;

        let persist_warning = if system {
            None
        } else {
            self.learned
                .put(AppRecord::new(&resolution.name, &path, elevated));
            Persistence::from_result("apps", self.learned.persist())
                .warning()
                .map(str::to_string)
        };

        if let Err(e) = self.activity.record(&resolution.name, Utc::now()) {
            tracing::warn!(error = %e, "failed to write activity log");
        }

        Ok(Opened {
            name: resolution.name,
            path,
            elevated,
            persist_warning,
        })
    }
}
