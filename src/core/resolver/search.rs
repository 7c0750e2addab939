//! Filesystem search for launchable entries.

use std::path::PathBuf;

use crate::core::index::{EntryKind, LaunchableKinds, display_name, walker};

/// A launchable entry whose name contains the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl Candidate {
    /// Name shown when asking the user to choose.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }
}

/// Walk `roots` in order and collect entries whose stripped base name
/// contains `target` (case-insensitive).
///
/// Shortcuts come before executables; within a kind the walk order is kept.
#[must_use]
pub fn find(
    roots: &[PathBuf],
    kinds: &LaunchableKinds,
    target: &str,
    max_depth: Option<usize>,
) -> Vec<Candidate> {
    let target = target.trim().to_lowercase();
    if target.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for root in roots {
        if !root.is_dir() {
            tracing::trace!(root = %root.display(), "search root missing");
            continue;
        }

        for entry in walker(root, kinds, max_depth) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::trace!(error = %e, "unreadable entry");
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let Some(kind) = kinds.classify(entry.path(), file_type) else {
                continue;
            };
            if display_name(entry.path()).to_lowercase().contains(&target) {
                found.push(Candidate {
                    path: entry.into_path(),
                    kind,
                });
            }
        }
    }

    // Stable, so walk order survives within each kind.
    found.sort_by_key(|c| c.kind);

    tracing::debug!(target = %target, count = found.len(), "filesystem search");
    found
}
