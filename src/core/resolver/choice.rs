//! Asking the user to pick among ambiguous candidates.

/// Spoken numbers accepted in free-text replies.
const SPOKEN: [&str; 5] = ["one", "two", "three", "four", "five"];

/// What the user answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// A 1-based position.
    Index(usize),
    /// A free-text reply such as `"two"` or `"option 3"`.
    Reply(String),
    /// No answer.
    Declined,
}

impl Choice {
    /// Zero-based position among `count` options, if the answer names one.
    #[must_use]
    pub fn position(&self, count: usize) -> Option<usize> {
        let n = match self {
            Self::Index(n) => *n,
            Self::Reply(reply) => parse_selection(reply)?,
            Self::Declined => return None,
        };
        (1..=count).contains(&n).then(|| n - 1)
    }
}

/// Pull a 1-based number out of a reply.
///
/// The first word that is a number, or one of `one`..`five`, decides.
#[must_use]
pub fn parse_selection(reply: &str) -> Option<usize> {
    reply
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .find_map(|word| {
            if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
                return word.parse().ok();
            }
            SPOKEN.iter().position(|s| *s == word).map(|i| i + 1)
        })
}

/// Picks one of several candidate names.
///
/// Blocks until answered; no timeout is imposed.
pub trait Disambiguator {
    fn choose(&mut self, options: &[String]) -> Choice;
}

impl<F> Disambiguator for F
where
    F: FnMut(&[String]) -> Choice,
{
    fn choose(&mut self, options: &[String]) -> Choice {
        self(options)
    }
}

/// Declines every question, for non-interactive use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl Disambiguator for NoPrompt {
    fn choose(&mut self, options: &[String]) -> Choice {
        tracing::debug!(count = options.len(), "ambiguous name, not prompting");
        Choice::Declined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_spoken_numbers() {
        assert_eq!(parse_selection("2"), Some(2));
        assert_eq!(parse_selection("option three"), Some(3));
        assert_eq!(parse_selection("Five."), Some(5));
        assert_eq!(parse_selection("number 4 please"), Some(4));
        assert_eq!(parse_selection("the blue one please"), Some(1));
    }

    #[test]
    fn first_number_wins() {
        assert_eq!(parse_selection("two or 3"), Some(2));
    }

    #[test]
    fn unparseable_replies() {
        assert_eq!(parse_selection(""), None);
        assert_eq!(parse_selection("none of them"), None);
        assert_eq!(parse_selection("six"), None);
    }

    #[test]
    fn position_is_range_checked() {
        assert_eq!(Choice::Index(2).position(3), Some(1));
        assert_eq!(Choice::Index(0).position(3), None);
        assert_eq!(Choice::Index(4).position(3), None);
        assert_eq!(Choice::Reply("five".into()).position(3), None);
        assert_eq!(Choice::Reply("one".into()).position(3), Some(0));
        assert_eq!(Choice::Declined.position(3), None);
    }

    #[test]
    fn closures_are_disambiguators() {
        let mut pick_last = |options: &[String]| Choice::Index(options.len());
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(pick_last.choose(&options), Choice::Index(2));
        assert_eq!(NoPrompt.choose(&options), Choice::Declined);
    }
}
