//! Snapshot of installed shortcuts.
//!
//! Scans known directories for shortcut files, resolves each to the program it
//! starts and keeps the ones whose program exists. The snapshot is read-only;
//! rescan to refresh it.

mod kind;
mod target;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::core::normalize_name;

pub use kind::{EntryKind, LaunchableKinds, display_name};
pub use target::{TargetError, desktop_exec, resolve_target, resolve_targets};

/// Build a recursive walker over `root` that sees every entry.
///
/// Hidden files and ignore files are irrelevant for application directories.
pub(crate) fn walker(root: &Path, kinds: &LaunchableKinds, max_depth: Option<usize>) -> ignore::Walk {
    let kinds = kinds.clone();
    ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(max_depth)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            // Never descend into bundles; the bundle itself is still yielded.
            entry
                .path()
                .parent()
                .is_none_or(|parent| !kinds.is_bundle(parent) || entry.depth() == 0)
        })
        .build()
}

/// Mapping from shortcut name to the program it starts.
#[derive(Debug, Clone, Default)]
pub struct ShortcutIndex {
    /// Keyed by normalized name; the value keeps the name as found.
    entries: BTreeMap<String, (String, PathBuf)>,
}

impl ShortcutIndex {
    /// Scan the configured directories.
    #[must_use]
    pub fn from_config(config: &IndexConfig) -> Self {
        Self::scan(&config.directories, &config.extensions)
    }

    /// Scan `directories` in order for files with one of `extensions`.
    ///
    /// Keys are base names without extension. When two shortcuts share a
    /// name, ignoring case, the one found later wins. Unresolvable shortcuts are skipped.
    #[must_use]
    pub fn scan(directories: &[PathBuf], extensions: &[String]) -> Self {
        let kinds = LaunchableKinds::shortcuts_only(extensions);

        let mut shortcuts = Vec::new();
        for dir in directories {
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "index directory missing");
                continue;
            }
            for entry in walker(dir, &kinds, None).flatten() {
                let Some(file_type) = entry.file_type() else {
                    continue;
                };
                if kinds.classify(entry.path(), file_type) == Some(EntryKind::Shortcut) {
                    shortcuts.push(entry.into_path());
                }
            }
        }

        let mut entries = BTreeMap::new();
        for (shortcut, target) in shortcuts.iter().zip(resolve_targets(&shortcuts)) {
            match target {
                Ok(target) if target.exists() => {
                    let name = display_name(shortcut);
                    entries.insert(normalize_name(&name), (name, target));
                }
                Ok(target) => {
                    tracing::debug!(
                        shortcut = %shortcut.display(),
                        target = %target.display(),
                        "shortcut target missing"
                    );
                }
                Err(e) => {
                    tracing::debug!(shortcut = %shortcut.display(), error = %e, "skipping shortcut");
                }
            }
        }

        tracing::info!(count = entries.len(), "indexed shortcuts");
        Self { entries }
    }

    /// Look up a shortcut name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries
            .get(&normalize_name(name))
            .map(|(_, path)| path.as_path())
    }

    /// Shortcut names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(name, _)| name.as_str())
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .values()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Number of shortcuts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
