//! Core logic shared by the CLI subcommands and the command loop.

pub mod activity;
pub mod assistant;
pub mod index;
pub mod launcher;
pub mod learned;
pub mod opener;
pub mod resolver;
pub mod routine;
pub mod security;
pub mod storage;

pub use index::ShortcutIndex;
pub use launcher::{LaunchError, Launcher, ProcessHost, SystemHost};
pub use learned::{AppRecord, LearnedAppStore};
pub use opener::{AppOpener, Failure, OpenOutcome, Opened};
pub use resolver::{Choice, Disambiguator, NameResolver, Resolution, ResolutionSource};
pub use routine::{AbortHandle, Deleted, Routine, RoutineEngine, RoutineError, RoutineStep, StepOutcome};
pub use storage::{Persistence, Storage};

/// Key form of an app or routine name: trimmed and lower-cased.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
