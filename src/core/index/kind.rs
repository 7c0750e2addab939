//! Which filesystem entries count as launchable.

use std::fs::FileType;
use std::path::Path;

/// Kind of launchable entry.
///
/// Ordering matters: shortcuts sort before executables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    /// A reference to something else (`.lnk`, `.desktop`, an `.app` bundle).
    Shortcut,
    /// A program started directly.
    Executable,
}

/// Extension sets deciding what is launchable.
#[derive(Debug, Clone, Default)]
pub struct LaunchableKinds {
    shortcut: Vec<String>,
    executable: Vec<String>,
}

impl LaunchableKinds {
    /// Build from extension lists (leading dots and case are ignored).
    #[must_use]
    pub fn new(shortcut: &[String], executable: &[String]) -> Self {
        let clean = |exts: &[String]| {
            exts.iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect()
        };
        Self {
            shortcut: clean(shortcut),
            executable: clean(executable),
        }
    }

    /// Shortcut extensions only.
    #[must_use]
    pub fn shortcuts_only(shortcut: &[String]) -> Self {
        Self::new(shortcut, &[])
    }

    /// Whether `ext` is a shortcut extension.
    #[must_use]
    pub fn is_shortcut_ext(&self, ext: &str) -> bool {
        self.shortcut.iter().any(|s| s.eq_ignore_ascii_case(ext))
    }

    /// Whether a directory is a bundle that must not be walked into.
    #[must_use]
    pub fn is_bundle(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| self.is_shortcut_ext(&ext))
    }

    /// Classify an entry.
    ///
    /// Directories count only as bundles. On Unix an extensionless regular
    /// file with an execute bit is an executable.
    #[must_use]
    pub fn classify(&self, path: &Path, file_type: FileType) -> Option<EntryKind> {
        let ext = extension(path);

        if file_type.is_dir() {
            return ext
                .filter(|e| self.is_shortcut_ext(e))
                .map(|_| EntryKind::Shortcut);
        }

        match ext {
            Some(ext) if self.is_shortcut_ext(&ext) => Some(EntryKind::Shortcut),
            Some(ext) if self.executable.iter().any(|e| *e == ext) => Some(EntryKind::Executable),
            Some(_) => None,
            None if file_type.is_file() && has_execute_bit(path) => Some(EntryKind::Executable),
            None => None,
        }
    }
}

/// Lower-cased extension of a path.
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

#[cfg(unix)]
fn has_execute_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;

    std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn has_execute_bit(_path: &Path) -> bool {
    false
}

/// Base name with the extension stripped, as shown to users.
#[must_use]
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
