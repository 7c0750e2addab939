//! Built-in system commands.
//!
//! These names always win over learned paths and search results, and their
//! admin requirement replaces whatever the caller asked for.

/// A compiled-in command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemCommand {
    /// Lower-case spoken name.
    pub name: &'static str,
    /// Program started (resolved on `PATH` when not absolute).
    pub path: &'static str,
    /// Whether the command always runs elevated.
    pub requires_admin: bool,
}

const fn cmd(name: &'static str, path: &'static str, requires_admin: bool) -> SystemCommand {
    SystemCommand {
        name,
        path,
        requires_admin,
    }
}

#[cfg(windows)]
pub const SYSTEM_COMMANDS: &[SystemCommand] = &[
    cmd("file explorer", "explorer.exe", false),
    cmd("control panel", "control.exe", false),
    cmd("task manager", "taskmgr.exe", true),
    cmd("cmd", "cmd.exe", true),
    cmd("powershell", "powershell.exe", true),
    cmd("notepad", "notepad.exe", false),
    cmd("registry", "regedit.exe", true),
];

#[cfg(target_os = "macos")]
pub const SYSTEM_COMMANDS: &[SystemCommand] = &[
    cmd("file explorer", "Finder", false),
    cmd("finder", "Finder", false),
    cmd("system settings", "System Settings", false),
    cmd("task manager", "Activity Monitor", false),
    cmd("activity monitor", "Activity Monitor", false),
    cmd("terminal", "Terminal", false),
    cmd("notepad", "TextEdit", false),
];

#[cfg(all(unix, not(target_os = "macos")))]
pub const SYSTEM_COMMANDS: &[SystemCommand] = &[
    cmd("file explorer", "nautilus", false),
    cmd("control panel", "gnome-control-center", false),
    cmd("task manager", "gnome-system-monitor", false),
    cmd("terminal", "x-terminal-emulator", false),
    cmd("root terminal", "x-terminal-emulator", true),
    cmd("notepad", "gedit", false),
];

/// Find a command by name, case-insensitively.
#[must_use]
pub fn lookup<'a>(commands: &'a [SystemCommand], name: &str) -> Option<&'a SystemCommand> {
    let name = name.trim();
    commands.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_lowercase_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for command in SYSTEM_COMMANDS {
            assert_eq!(command.name, command.name.to_lowercase());
            assert!(seen.insert(command.name), "duplicate {}", command.name);
        }
    }

    #[test]
    fn lookup_ignores_case() {
        let found = lookup(SYSTEM_COMMANDS, "  NOTEPAD ").unwrap();
        assert_eq!(found.name, "notepad");
        assert!(lookup(SYSTEM_COMMANDS, "spotify").is_none());
    }
}
