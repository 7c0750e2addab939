//! Named, ordered lists of apps opened together.
//!
//! Steps run one after another. A failing step is reported and the routine
//! moves on. An abort request is honored between steps.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::normalize_name;
use crate::core::opener::{AppOpener, Failure, is_placeholder};
use crate::core::storage::{Persistence, Storage, StorageError};

const TABLE: &str = "routines";

/// Routine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutineError {
    #[error("routine '{0}' not found")]
    NotFound(String),

    #[error("routine '{0}' already exists")]
    Duplicate(String),

    #[error("routine name is empty")]
    EmptyName,

    #[error("routine '{0}' has no apps")]
    NoSteps(String),
}

/// Result type for routine operations.
pub type Result<T> = std::result::Result<T, RoutineError>;

/// One app to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineStep {
    /// App name, resolved when the step runs.
    #[serde(rename = "name", alias = "app")]
    pub app_name: String,

    /// Request an elevated launch.
    #[serde(default)]
    pub admin: bool,
}

impl RoutineStep {
    #[must_use]
    pub fn new(app_name: impl Into<String>, admin: bool) -> Self {
        Self {
            app_name: app_name.into(),
            admin,
        }
    }

    /// Parse `app` or `app:admin`.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.rsplit_once(':') {
            Some((app, flag)) if flag.trim().eq_ignore_ascii_case("admin") => Self::new(app.trim(), true),
            _ => Self::new(spec.trim(), false),
        }
    }
}

/// A named routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    /// Name as authored.
    pub name: String,
    pub steps: Vec<RoutineStep>,
}

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub app_name: String,
    pub launched: bool,
    /// Why the step failed.
    pub reason: Option<String>,
    /// Non-fatal problem, such as the learned table not being saved.
    pub warning: Option<String>,
}

impl StepOutcome {
    fn failed(app_name: &str, failure: &Failure) -> Self {
        Self {
            app_name: app_name.to_string(),
            launched: false,
            reason: Some(failure.to_string()),
            warning: None,
        }
    }
}

/// Result of deleting a routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    Removed(Persistence),
    /// There was no such routine; nothing changed.
    Absent,
}

/// Shared flag asking a running routine to stop before its next step.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the routine table and runs routines through an [`AppOpener`].
#[derive(Debug)]
pub struct RoutineEngine {
    storage: Storage,
    /// Keyed by normalized name.
    routines: BTreeMap<String, Routine>,
    opener: AppOpener,
    abort: AbortHandle,
}

impl RoutineEngine {
    /// Create an engine and load the persisted routine table.
    ///
    /// A missing or unreadable table yields no routines.
    #[must_use]
    pub fn new(storage: Storage, opener: AppOpener) -> Self {
        let routines = load_table(&storage);
        Self {
            storage,
            routines,
            opener,
            abort: AbortHandle::new(),
        }
    }

    /// Use `handle` to receive abort requests.
    #[must_use]
    pub fn with_abort_handle(mut self, handle: AbortHandle) -> Self {
        self.abort = handle;
        self
    }

    /// Handle for stopping a running routine.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn opener_mut(&mut self) -> &mut AppOpener {
        &mut self.opener
    }

    /// All routines, sorted case-insensitively by name.
    pub fn list(&self) -> impl Iterator<Item = &Routine> {
        self.routines.values()
    }

    /// Look up a routine, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Routine> {
        self.routines.get(&normalize_name(name))
    }

    /// Add a routine and save the table.
    ///
    /// Blank and placeholder steps are dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or taken, or no step remains.
    pub fn create(&mut self, name: &str, steps: Vec<RoutineStep>) -> Result<Persistence> {
        let name = name.trim();
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(RoutineError::EmptyName);
        }
        if let Some(existing) = self.routines.get(&key) {
            return Err(RoutineError::Duplicate(existing.name.clone()));
        }

        let steps: Vec<RoutineStep> = steps
            .into_iter()
            .filter(|s| !is_placeholder(&s.app_name))
            .map(|s| RoutineStep::new(s.app_name.trim(), s.admin))
            .collect();
        if steps.is_empty() {
            return Err(RoutineError::NoSteps(name.to_string()));
        }

        tracing::info!(routine = %name, steps = steps.len(), "created routine");
        self.routines.insert(
            key,
            Routine {
                name: name.to_string(),
                steps,
            },
        );
        Ok(self.persist())
    }

    /// Remove a routine and save the table.
    pub fn delete(&mut self, name: &str) -> Deleted {
        match self.routines.remove(&normalize_name(name)) {
            Some(removed) => {
                tracing::info!(routine = %removed.name, "deleted routine");
                Deleted::Removed(self.persist())
            }
            None => {
                tracing::debug!(routine = %name, "nothing to delete");
                Deleted::Absent
            }
        }
    }

    /// Run every step of a routine in order.
    ///
    /// One outcome is returned per step. Steps after an abort request are
    /// reported as aborted without being attempted.
    ///
    /// # Errors
    ///
    /// Returns [`RoutineError::NotFound`] for an unknown routine.
    pub fn run(&mut self, name: &str) -> Result<Vec<StepOutcome>> {
        let routine = self
            .get(name)
            .cloned()
            .ok_or_else(|| RoutineError::NotFound(name.trim().to_string()))?;

        self.abort.reset();
        tracing::info!(routine = %routine.name, steps = routine.steps.len(), "running routine");

        let mut outcomes = Vec::with_capacity(routine.steps.len());
        for (i, step) in routine.steps.iter().enumerate() {
            if i > 0 && self.abort.is_aborted() {
                tracing::info!(routine = %routine.name, step = i, "routine aborted");
                outcomes.extend(
                    routine.steps[i..]
                        .iter()
                        .map(|s| StepOutcome::failed(&s.app_name, &Failure::Aborted)),
                );
                break;
            }

            let outcome = match self.opener.open(&step.app_name, step.admin) {
                Ok(opened) => StepOutcome {
                    app_name: step.app_name.clone(),
                    launched: true,
                    reason: None,
                    warning: opened.persist_warning,
                },
                Err(failure) => {
                    tracing::warn!(app = %step.app_name, reason = %failure, "routine step failed");
                    StepOutcome::failed(&step.app_name, &failure)
                }
            };
            outcomes.push(outcome);
        }

        let launched = outcomes.iter().filter(|o| o.launched).count();
        tracing::info!(routine = %routine.name, launched, total = outcomes.len(), "routine finished");
        Ok(outcomes)
    }

    fn persist(&self) -> Persistence {
        let table: BTreeMap<&str, &[RoutineStep]> = self
            .routines
            .values()
            .map(|r| (r.name.as_str(), r.steps.as_slice()))
            .collect();
        Persistence::from_result(TABLE, self.storage.write(&[TABLE], &table))
    }
}

/// Read the routine table, validating each routine on its own.
fn load_table(storage: &Storage) -> BTreeMap<String, Routine> {
    let raw: BTreeMap<String, serde_json::Value> = match storage.read(&[TABLE]) {
        Ok(raw) => raw,
        Err(StorageError::NotFound(_)) => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, "routine table unreadable, starting empty");
            return BTreeMap::new();
        }
    };

    let mut routines = BTreeMap::new();
    for (name, value) in raw {
        let key = normalize_name(&name);
        if key.is_empty() {
            tracing::warn!("skipping routine with empty name");
            continue;
        }
        if routines.contains_key(&key) {
            tracing::warn!(routine = %name, "skipping duplicate routine");
            continue;
        }
        let steps: Vec<RoutineStep> = match serde_json::from_value(value) {
            Ok(steps) => steps,
            Err(e) => {
                tracing::warn!(routine = %name, error = %e, "skipping malformed routine");
                continue;
            }
        };
        let steps = steps
            .into_iter()
            .filter(|s| !is_placeholder(&s.app_name))
            .collect();
        routines.insert(key, Routine { name, steps });
    }

    tracing::debug!(count = routines.len(), "loaded routines");
    routines
}
