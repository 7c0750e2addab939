//! Text command loop.
//!
//! Each input line is matched against a few keyword patterns; nothing smarter.

use std::io::Write;

use crate::core::opener::Failure;
use crate::core::routine::RoutineEngine;
use crate::core::security;

/// Words that end the loop when they appear anywhere in a line.
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "stop"];

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    /// The line contains a blocked phrase.
    Blocked(String),
    Open { app: String, admin: bool },
    RunRoutine(String),
    ListRoutines,
    Unknown,
}

/// Parse one line. Blank lines yield `None`.
#[must_use]
pub fn parse(line: &str, blocked: &[String]) -> Option<Command> {
    let line = line.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if line.is_empty() {
        return None;
    }

    let words: Vec<&str> = line.split(' ').collect();
    if words.iter().any(|w| EXIT_WORDS.contains(w)) || line.contains("close assistant") {
        return Some(Command::Exit);
    }

    if let Some(phrase) = security::blocked_phrase(&line, blocked) {
        return Some(Command::Blocked(phrase.to_string()));
    }

    let (clean, admin) = strip_admin_markers(&words);

    if clean == "list routines" || clean == "show routines" {
        return Some(Command::ListRoutines);
    }
    for prefix in ["run routine", "start routine"] {
        if let Some(name) = after_phrase(&clean, prefix) {
            return Some(Command::RunRoutine(name.to_string()));
        }
    }
    if let Some(app) = after_phrase(&clean, "open") {
        return Some(Command::Open {
            app: app.to_string(),
            admin,
        });
    }

    Some(Command::Unknown)
}

/// Remove "as admin", "as administrator" and a bare "administrator".
fn strip_admin_markers(words: &[&str]) -> (String, bool) {
    let mut kept = Vec::with_capacity(words.len());
    let mut admin = false;
    let mut i = 0;
    while i < words.len() {
        let marker = match words[i..] {
            ["as", "admin" | "administrator", ..] => 2,
            ["administrator", ..] => 1,
            _ => 0,
        };
        if marker == 0 {
            kept.push(words[i]);
            i += 1;
        } else {
            admin = true;
            i += marker;
        }
    }
    (kept.join(" "), admin)
}

/// Text following the first whole-word occurrence of `phrase`.
fn after_phrase<'a>(line: &'a str, phrase: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(found) = line[from..].find(phrase) {
        let start = from + found;
        let end = start + phrase.len();
        let starts_word = start == 0 || line[..start].ends_with(' ');
        let ends_word = end == line.len() || line[end..].starts_with(' ');
        if starts_word && ends_word {
            return Some(line[end..].trim());
        }
        from = end;
    }
    None
}

/// Runs the command loop over a routine engine.
#[derive(Debug)]
pub struct Assistant {
    engine: RoutineEngine,
    blocked: Vec<String>,
}

impl Assistant {
    #[must_use]
    pub fn new(engine: RoutineEngine, blocked: Vec<String>) -> Self {
        Self { engine, blocked }
    }

    /// Read commands from `lines` until an exit command or end of input.
    ///
    /// # Errors
    ///
    /// Returns error if writing a reply fails.
    pub fn run<W: Write>(
        &mut self,
        lines: impl IntoIterator<Item = String>,
        out: &mut W,
    ) -> std::io::Result<()> {
        writeln!(out, "Ready.")?;
        for line in lines {
            let Some(command) = parse(&line, &self.blocked) else {
                continue;
            };
            tracing::debug!(?command, "assistant command");
            if command == Command::Exit {
                writeln!(out, "Goodbye!")?;
                return Ok(());
            }
            for reply in self.handle(command) {
                writeln!(out, "{reply}")?;
            }
            out.flush()?;
        }
        Ok(())
    }

    /// Carry out one command, returning the lines to show.
    pub fn handle(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::Exit => vec!["Goodbye!".to_string()],
            Command::Blocked(phrase) => {
                tracing::warn!(phrase = %phrase, "blocked command");
                vec![format!("Blocked: '{phrase}' is not allowed.")]
            }
            Command::Open { app, admin } => self.open(&app, admin),
            Command::RunRoutine(name) => self.run_routine(&name),
            Command::ListRoutines => {
                let names: Vec<String> = self.engine.list().map(|r| format!("  - {}", r.name)).collect();
                if names.is_empty() {
                    vec!["No routines found.".to_string()]
                } else {
                    std::iter::once("Here are your routines:".to_string())
                        .chain(names)
                        .collect()
                }
            }
            Command::Unknown => vec!["Command not recognized".to_string()],
        }
    }

    fn open(&mut self, app: &str, admin: bool) -> Vec<String> {
        match self.engine.opener_mut().open(app, admin) {
            Ok(opened) => {
                let mut replies = vec![if opened.elevated {
                    format!("Opened {} as administrator", opened.name)
                } else {
                    format!("Opened {}", opened.name)
                }];
                if let Some(warning) = opened.persist_warning {
                    replies.push(format!("warning: could not save learned apps: {warning}"));
                }
                replies
            }
            Err(Failure::Rejected) => vec!["Which app should I open?".to_string()],
            Err(Failure::NotFound | Failure::Ambiguous) => vec![format!("Could not find {app}")],
            Err(e) => vec![format!("Could not open {app}: {e}")],
        }
    }

    fn run_routine(&mut self, name: &str) -> Vec<String> {
        let display = match self.engine.get(name) {
            Some(routine) => routine.name.clone(),
            None => return vec![format!("No routine named {name} found.")],
        };

        let outcomes = match self.engine.run(name) {
            Ok(outcomes) => outcomes,
            Err(e) => return vec![e.to_string()],
        };

        let mut replies = vec![format!("Starting routine: {display}")];
        for outcome in outcomes {
            replies.push(match outcome.reason {
                None => format!("  {}: opened", outcome.app_name),
                Some(reason) => format!("  {}: {reason}", outcome.app_name),
            });
        }
        replies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked() -> Vec<String> {
        security::default_blocked()
    }

    fn parsed(line: &str) -> Option<Command> {
        parse(line, &blocked())
    }

    #[test]
    fn exit_words_end_the_loop() {
        assert_eq!(parsed("exit"), Some(Command::Exit));
        assert_eq!(parsed("OK quit now"), Some(Command::Exit));
        assert_eq!(parsed("close assistant"), Some(Command::Exit));
        assert_eq!(parsed("open stopwatch"), Some(Command::Open { app: "stopwatch".into(), admin: false }));
    }

    #[test]
    fn blacklist_is_checked_before_anything_else() {
        assert_eq!(parsed("open format c:"), Some(Command::Blocked("format".into())));
        assert_eq!(parsed("please SHUTDOWN"), Some(Command::Blocked("shutdown".into())));
    }

    #[test]
    fn open_with_admin_markers() {
        assert_eq!(
            parsed("open task manager as admin"),
            Some(Command::Open { app: "task manager".into(), admin: true })
        );
        assert_eq!(
            parsed("Please open  CMD administrator"),
            Some(Command::Open { app: "cmd".into(), admin: true })
        );
        assert_eq!(
            parsed("open notepad as administrator"),
            Some(Command::Open { app: "notepad".into(), admin: true })
        );
        assert_eq!(
            parsed("open administrator tools"),
            Some(Command::Open { app: "tools".into(), admin: true })
        );
        assert_eq!(
            parsed("open vlc as adminer"),
            Some(Command::Open { app: "vlc as adminer".into(), admin: false })
        );
        assert_eq!(
            parsed("open spotify"),
            Some(Command::Open { app: "spotify".into(), admin: false })
        );
    }

    #[test]
    fn routine_commands() {
        assert_eq!(parsed("run routine morning"), Some(Command::RunRoutine("morning".into())));
        assert_eq!(parsed("start routine dev setup"), Some(Command::RunRoutine("dev setup".into())));
        assert_eq!(parsed("list routines"), Some(Command::ListRoutines));
    }

    #[test]
    fn everything_else() {
        assert_eq!(parsed("   "), None);
        assert_eq!(parsed("what time is it"), Some(Command::Unknown));
        assert_eq!(parsed("reopen the door"), Some(Command::Unknown));
    }
}
