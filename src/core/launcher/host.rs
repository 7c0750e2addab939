//! Starting programs on the running operating system.

use std::path::Path;
use std::process::{Child, Command, Stdio};

use super::{LaunchError, ProcessHost};

/// Host backed by the operating system's own launch mechanisms.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl ProcessHost for SystemHost {
    fn start_detached(&self, path: &Path) -> Result<(), LaunchError> {
        imp::start_detached(path)
    }

    fn start_elevated(&self, path: &Path) -> Result<(), LaunchError> {
        imp::start_elevated(path)
    }

    fn is_elevated(&self) -> bool {
        imp::is_elevated()
    }
}

/// Spawn without waiting, reaping the child on a background thread.
fn spawn_detached(command: &mut Command, path: &Path) -> Result<(), LaunchError> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;
    reap(child, path);
    Ok(())
}

fn reap(mut child: Child, path: &Path) {
    let path = path.display().to_string();
    std::thread::spawn(move || match child.wait() {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::debug!(path = %path, %status, "launched program exited"),
        Err(e) => tracing::debug!(path = %path, error = %e, "failed to reap child"),
    });
}

/// Run a short-lived hand-off command and wait for its exit status.
#[cfg(not(target_os = "macos"))]
fn handoff(command: &mut Command, path: &Path) -> Result<std::process::ExitStatus, LaunchError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| LaunchError::Spawn {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(target_os = "macos"))]
fn exited(path: &Path, what: &str, status: std::process::ExitStatus) -> LaunchError {
    LaunchError::Spawn {
        path: path.to_path_buf(),
        source: std::io::Error::other(format!("{what} exited with {status}")),
    }
}

/// Run `path` directly from its own directory.
fn direct(path: &Path) -> Command {
    let mut command = Command::new(path);
    if let Some(dir) = path.parent().filter(|d| d.is_dir()) {
        command.current_dir(dir);
    }
    command
}

#[cfg(unix)]
fn is_root() -> bool {
    Command::new("id")
        .arg("-u")
        .output()
        .is_ok_and(|out| out.status.success() && String::from_utf8_lossy(&out.stdout).trim() == "0")
}

#[cfg(windows)]
mod imp {
    use super::{Command, LaunchError, Path, Stdio, direct, exited, handoff, spawn_detached};

    pub fn start_detached(path: &Path) -> Result<(), LaunchError> {
        let executable = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("exe"));
        if executable {
            return spawn_detached(&mut direct(path), path);
        }

        // `start` hands the path to the shell, which follows shortcuts, and
        // exits as soon as the hand-off is done.
        let status = handoff(Command::new("cmd").args(["/C", "start", ""]).arg(path), path)?;
        if status.success() {
            Ok(())
        } else {
            Err(exited(path, "start", status))
        }
    }

    pub fn start_elevated(path: &Path) -> Result<(), LaunchError> {
        let quoted = path.display().to_string().replace('\'', "''");
        let script = format!("Start-Process -FilePath '{quoted}' -Verb RunAs");

        // Returns once the consent prompt is answered.
        let status = handoff(
            Command::new("powershell").args(["-NoProfile", "-NonInteractive", "-Command", &script]),
            path,
        )?;

        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::ElevationDeclined(path.to_path_buf()))
        }
    }

    pub fn is_elevated() -> bool {
        Command::new("net")
            .arg("session")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use super::{Command, LaunchError, Path, direct, is_root, spawn_detached};

    pub fn start_detached(path: &Path) -> Result<(), LaunchError> {
        let bundle = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("app"));
        let bare = path.components().count() == 1;

        if bundle || bare {
            spawn_detached(Command::new("open").arg("-a").arg(path), path)
        } else {
            spawn_detached(&mut direct(path), path)
        }
    }

    pub fn start_elevated(_path: &Path) -> Result<(), LaunchError> {
        Err(LaunchError::ElevationUnavailable(
            "elevated launch is not supported on macOS".to_string(),
        ))
    }

    pub fn is_elevated() -> bool {
        is_root()
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
mod imp {
    use super::{Command, LaunchError, Path, direct, exited, handoff, is_root, spawn_detached};

    /// Run as root: refuse a missing program, then start it in the background
    /// so `pkexec` returns once authorization is settled.
    const ELEVATED_SCRIPT: &str =
        r#"command -v "$0" >/dev/null || exit 2; cd "$(dirname "$0")" 2>/dev/null; "$0" </dev/null >/dev/null 2>&1 &"#;

    pub fn start_detached(path: &Path) -> Result<(), LaunchError> {
        let desktop = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("desktop"));

        if desktop {
            spawn_detached(Command::new("gio").arg("launch").arg(path), path)
        } else {
            spawn_detached(&mut direct(path), path)
        }
    }

    pub fn start_elevated(path: &Path) -> Result<(), LaunchError> {
        let pkexec = which::which("pkexec")
            .map_err(|_| LaunchError::ElevationUnavailable("pkexec not found on PATH".to_string()))?;
        elevate_with(Command::new(pkexec), path)
    }

    /// Start `path` through an already prepared `pkexec` command.
    pub(super) fn elevate_with(mut pkexec: Command, path: &Path) -> Result<(), LaunchError> {
        let status = handoff(
            pkexec.arg("/bin/sh").arg("-c").arg(ELEVATED_SCRIPT).arg(path),
            path,
        )?;
        match status.code() {
            Some(0) => Ok(()),
            // Dismissed prompt or failed authorization.
            Some(126 | 127) => Err(LaunchError::ElevationDeclined(path.to_path_buf())),
            _ => Err(exited(path, "pkexec", status)),
        }
    }

    pub fn is_elevated() -> bool {
        is_root()
    }
}
