//! Correcting slightly misheard names against known ones.

use similar::TextDiff;

/// Character-level similarity in `0.0..=1.0` (twice the matched characters
/// over the combined length).
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Replace `name` with the most similar known name scoring at least `cutoff`.
///
/// Below the cutoff the name comes back unchanged. Ties keep the earlier
/// known name.
#[must_use]
pub fn correct<'a>(name: &str, known: impl IntoIterator<Item = &'a str>, cutoff: f64) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut best: Option<(&str, f64)> = None;
    for candidate in known {
        let score = similarity(name, candidate);
        if score >= cutoff && best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) => {
            if candidate != name {
                tracing::debug!(from = %name, to = %candidate, score, "fuzzy correction");
            }
            candidate.to_string()
        }
        None => name.to_string(),
    }
}
