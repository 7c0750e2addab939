//! Interactive prompts.

use std::io::Write as _;

use dialoguer::{Confirm, Select, theme::ColorfulTheme};

use crate::core::index::ShortcutIndex;
use crate::core::resolver::{Choice, Disambiguator};
use crate::core::routine::RoutineStep;

/// Terminal menu listing the candidates plus a way out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectPrompt;

impl Disambiguator for SelectPrompt {
    fn choose(&mut self, options: &[String]) -> Choice {
        let mut items = options.to_vec();
        items.push("None of these".to_string());

        match Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Several apps match, which one?")
            .items(&items)
            .default(0)
            .interact_opt()
        {
            Ok(Some(i)) if i < options.len() => Choice::Index(i + 1),
            Ok(_) => Choice::Declined,
            Err(e) => {
                tracing::warn!(error = %e, "selection prompt failed");
                Choice::Declined
            }
        }
    }
}

/// Numbered list answered with a free-text line, for the command loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyPrompt;

impl Disambiguator for ReplyPrompt {
    fn choose(&mut self, options: &[String]) -> Choice {
        println!("I found multiple matches:");
        for (i, option) in options.iter().enumerate() {
            println!("Option {}: {option}", i + 1);
        }
        print!("Which one? ");
        let _ = std::io::stdout().flush();

        let mut reply = String::new();
        match std::io::stdin().read_line(&mut reply) {
            Ok(0) => Choice::Declined,
            Ok(_) => Choice::Reply(reply.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read reply");
                Choice::Declined
            }
        }
    }
}

/// Lines from standard input, read one at a time.
///
/// The lock is released between lines so prompts can read replies.
pub fn stdin_lines() -> impl Iterator<Item = String> {
    std::iter::from_fn(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    })
}

/// Pick routine steps from installed shortcuts until "Done".
///
/// # Errors
///
/// Returns error if the terminal cannot be prompted.
pub fn author_steps(index: &ShortcutIndex) -> anyhow::Result<Vec<RoutineStep>> {
    if index.is_empty() {
        anyhow::bail!("no installed shortcuts found; pass apps with --step instead");
    }

    let theme = ColorfulTheme::default();
    let mut items = vec!["Done".to_string()];
    items.extend(index.names().map(str::to_string));

    let mut steps = Vec::new();
    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt(format!("Step {}: select app", steps.len() + 1))
            .items(&items)
            .default(0)
            .interact()?;
        if selection == 0 {
            break;
        }

        let app = items[selection].clone();
        let admin = Confirm::with_theme(&theme)
            .with_prompt(format!("Run {app} as admin?"))
            .default(false)
            .interact()?;
        steps.push(RoutineStep::new(app, admin));
    }

    Ok(steps)
}
