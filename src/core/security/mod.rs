//! Blocked command phrases.
//!
//! A pass/fail check only: a command is rejected when any configured phrase
//! appears in it as whole words, case-insensitively.

/// Phrases rejected unless the configuration replaces the list.
const DEFAULT_BLOCKED: &[&str] = &[
    // Disk and partition tools
    "format",
    "diskpart",
    "mkfs",
    "dd if=",
    // Deletion
    "rm -rf",
    "del /f",
    "del /s",
    "rmdir /s",
    "rd /s",
    // Registry and boot configuration
    "reg delete",
    "bcdedit",
    // Power
    "shutdown",
    "reboot",
    "poweroff",
    // Accounts
    "net user",
    "passwd",
];

/// The built-in blocked phrases.
#[must_use]
pub fn default_blocked() -> Vec<String> {
    DEFAULT_BLOCKED.iter().map(|s| (*s).to_string()).collect()
}

/// Return the first blocked phrase contained in `command`, if any.
///
/// Whitespace runs in the command are collapsed before matching.
#[must_use]
pub fn blocked_phrase<'a>(command: &str, blocked: &'a [String]) -> Option<&'a str> {
    let command = command
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    blocked
        .iter()
        .map(String::as_str)
        .filter(|phrase| !phrase.trim().is_empty())
        .find(|phrase| contains_phrase(&command, &phrase.trim().to_lowercase()))
}

/// Whole-word containment: "format" matches "format c:" but not "information".
///
/// A phrase ending in punctuation (such as `dd if=`) may run into the next
/// characters.
fn contains_phrase(command: &str, phrase: &str) -> bool {
    let open_ended = phrase
        .chars()
        .last()
        .is_some_and(|c| !c.is_alphanumeric());

    command.match_indices(phrase).any(|(start, _)| {
        let before = command[..start].chars().next_back();
        let after = command[start + phrase.len()..].chars().next();
        let starts_word = before.is_none_or(|c| !c.is_alphanumeric());
        let ends_word = open_ended || after.is_none_or(|c| !c.is_alphanumeric());
        starts_word && ends_word
    })
}

/// Check whether a command is blocked.
#[must_use]
pub fn is_blocked(command: &str, blocked: &[String]) -> bool {
    blocked_phrase(command, blocked).is_some()
}
