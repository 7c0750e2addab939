//! Per-platform default locations and launchable file kinds.

use std::path::PathBuf;

/// Read an environment variable as a path, skipping unset or empty values.
fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Start menu directories holding shell shortcuts (Windows).
#[cfg(windows)]
fn start_menu_dirs() -> Vec<PathBuf> {
    const PROGRAMS: &str = r"Microsoft\Windows\Start Menu\Programs";
    [env_path("ProgramData"), dirs::config_dir()]
        .into_iter()
        .flatten()
        .map(|base| base.join(PROGRAMS))
        .collect()
}

/// Directories scanned for the shortcut index.
#[cfg(windows)]
#[must_use]
pub fn index_dirs() -> Vec<PathBuf> {
    start_menu_dirs()
}

/// Ordered roots walked by the filesystem search.
#[cfg(windows)]
#[must_use]
pub fn search_roots() -> Vec<PathBuf> {
    let mut roots = start_menu_dirs();
    roots.extend(
        [
            dirs::desktop_dir(),
            env_path("ProgramFiles"),
            env_path("ProgramFiles(x86)"),
            dirs::data_local_dir(),
        ]
        .into_iter()
        .flatten(),
    );
    roots
}

#[cfg(windows)]
#[must_use]
pub fn shortcut_extensions() -> Vec<String> {
    vec!["lnk".to_string()]
}

#[cfg(windows)]
#[must_use]
pub fn executable_extensions() -> Vec<String> {
    vec!["exe".to_string()]
}

#[cfg(target_os = "macos")]
#[must_use]
pub fn index_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications"),
    ];
    dirs.extend(env_path("HOME").map(|home| home.join("Applications")));
    dirs
}

#[cfg(target_os = "macos")]
#[must_use]
pub fn search_roots() -> Vec<PathBuf> {
    let mut roots = index_dirs();
    roots.extend(dirs::desktop_dir());
    roots
}

#[cfg(target_os = "macos")]
#[must_use]
pub fn shortcut_extensions() -> Vec<String> {
    vec!["app".to_string()]
}

#[cfg(target_os = "macos")]
#[must_use]
pub fn executable_extensions() -> Vec<String> {
    Vec::new()
}

#[cfg(all(unix, not(target_os = "macos")))]
#[must_use]
pub fn index_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("/usr/share/applications")];
    dirs.extend(dirs::data_dir().map(|data| data.join("applications")));
    dirs
}

#[cfg(all(unix, not(target_os = "macos")))]
#[must_use]
pub fn search_roots() -> Vec<PathBuf> {
    let mut roots = index_dirs();
    roots.extend(dirs::desktop_dir());
    roots.push(PathBuf::from("/usr/local/bin"));
    roots.push(PathBuf::from("/opt"));
    roots.extend(dirs::executable_dir());
    roots
}

#[cfg(all(unix, not(target_os = "macos")))]
#[must_use]
pub fn shortcut_extensions() -> Vec<String> {
    vec!["desktop".to_string()]
}

#[cfg(all(unix, not(target_os = "macos")))]
#[must_use]
pub fn executable_extensions() -> Vec<String> {
    vec!["appimage".to_string()]
}
