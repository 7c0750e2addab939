//! Resolving shortcuts to the program they start.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// `.lnk` files queried per PowerShell invocation.
const LNK_BATCH: usize = 50;

/// Why a shortcut could not be resolved.
#[derive(Debug, Error)]
pub enum TargetError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The shortcut format cannot be read on this platform.
    #[error("unsupported shortcut: {0}")]
    Unsupported(String),

    /// The shortcut names no program.
    #[error("no target in {0}")]
    NoTarget(String),

    /// The desktop entry asks to be hidden.
    #[error("hidden entry")]
    Hidden,

    /// The program named by the shortcut is not on `PATH`.
    #[error("{0} not found on PATH")]
    NotOnPath(String),

    /// The Windows shell query failed.
    #[error("shell query failed: {0}")]
    Shell(String),
}

/// Target resolution result.
pub type Result<T> = std::result::Result<T, TargetError>;

/// Resolve one shortcut.
///
/// # Errors
///
/// Returns error if the shortcut is unreadable or names nothing.
pub fn resolve_target(path: &Path) -> Result<PathBuf> {
    resolve_targets(&[path.to_path_buf()])
        .pop()
        .unwrap_or_else(|| Err(TargetError::NoTarget(path.display().to_string())))
}

/// Resolve shortcuts in bulk, preserving order.
///
/// `.lnk` files are grouped so the Windows shell is queried once per batch
/// instead of once per file.
#[must_use]
pub fn resolve_targets(paths: &[PathBuf]) -> Vec<Result<PathBuf>> {
    let mut results: Vec<Option<Result<PathBuf>>> = Vec::with_capacity(paths.len());
    let mut lnk = Vec::new();

    for (i, path) in paths.iter().enumerate() {
        if has_extension(path, "lnk") {
            lnk.push(i);
            results.push(None);
        } else {
            results.push(Some(resolve_single(path)));
        }
    }

    for chunk in lnk.chunks(LNK_BATCH) {
        let batch: Vec<&Path> = chunk.iter().map(|&i| paths[i].as_path()).collect();
        for (&i, result) in chunk.iter().zip(lnk_targets(&batch)) {
            results[i] = Some(result);
        }
    }

    results
        .into_iter()
        .zip(paths)
        .map(|(r, p)| r.unwrap_or_else(|| Err(TargetError::NoTarget(p.display().to_string()))))
        .collect()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn resolve_single(path: &Path) -> Result<PathBuf> {
    let meta = std::fs::symlink_metadata(path)?;

    if meta.is_dir() {
        return Ok(path.to_path_buf());
    }
    if meta.file_type().is_symlink() {
        return Ok(std::fs::canonicalize(path)?);
    }
    if has_extension(path, "desktop") {
        let contents = std::fs::read_to_string(path)?;
        let program = desktop_exec(&contents)?
            .ok_or_else(|| TargetError::NoTarget(path.display().to_string()))?;
        return locate_program(&program);
    }

    Ok(path.to_path_buf())
}

/// Find a program named by a shortcut, searching `PATH` for bare names.
fn locate_program(program: &str) -> Result<PathBuf> {
    let candidate = Path::new(program);
    if candidate.is_absolute() {
        return Ok(candidate.to_path_buf());
    }
    which::which(program).map_err(|_| TargetError::NotOnPath(program.to_string()))
}

/// Extract the program of a freedesktop entry's `Exec` key.
///
/// Only the `[Desktop Entry]` group is read. Returns `Ok(None)` when there is
/// no `Exec` key.
///
/// # Errors
///
/// Returns [`TargetError::Hidden`] for `Hidden=true` entries.
pub fn desktop_exec(contents: &str) -> Result<Option<String>> {
    let mut in_entry = false;
    let mut exec = None;

    for line in contents.lines().map(str::trim) {
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "Hidden" if value.trim().eq_ignore_ascii_case("true") => {
                return Err(TargetError::Hidden);
            }
            "Exec" => exec = Some(value.trim().to_string()),
            _ => {}
        }
    }

    Ok(exec.as_deref().and_then(exec_program))
}

/// First real program token of an `Exec` value.
///
/// Skips an `env` prefix with its `VAR=value` assignments and field codes.
fn exec_program(exec: &str) -> Option<String> {
    let mut tokens = split_exec(exec).into_iter().peekable();

    if tokens.peek().is_some_and(|t| t == "env") {
        tokens.next();
        while tokens.peek().is_some_and(|t| t.contains('=')) {
            tokens.next();
        }
    }

    tokens.find(|t| !t.starts_with('%'))
}

/// Split an `Exec` value on whitespace, honoring double quotes.
fn split_exec(exec: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '\\' if quoted => current.extend(chars.next()),
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Ask the Windows shell for the targets of a batch of `.lnk` files.
fn lnk_targets(paths: &[&Path]) -> Vec<Result<PathBuf>> {
    let fail_all = |reason: String| -> Vec<Result<PathBuf>> {
        paths
            .iter()
            .map(|_| Err(TargetError::Shell(reason.clone())))
            .collect()
    };

    if !cfg!(windows) {
        return paths
            .iter()
            .map(|p| Err(TargetError::Unsupported(p.display().to_string())))
            .collect();
    }

    let list = paths
        .iter()
        .map(|p| format!("'{}'", p.display().to_string().replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",");
    let script = format!(
        "$s = New-Object -ComObject WScript.Shell; \
         @({list}) | ForEach-Object {{ try {{ $s.CreateShortcut($_).TargetPath }} catch {{ '' }} }}"
    );

    let output = match Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(output) => return fail_all(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        Err(e) => return fail_all(e.to_string()),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().map(str::trim).collect();
    if lines.len() != paths.len() {
        return fail_all(format!(
            "expected {} targets, got {}",
            paths.len(),
            lines.len()
        ));
    }

    paths
        .iter()
        .zip(lines)
        .map(|(path, line)| {
            if line.is_empty() {
                Err(TargetError::NoTarget(path.display().to_string()))
            } else {
                Ok(PathBuf::from(line))
            }
        })
        .collect()
}
