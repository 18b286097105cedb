//! Comparison of a dictated or transcribed word against its reference.
//!
//! Both sides are normalized before comparing: Unicode NFC, lowercase,
//! punctuation removed (except apostrophes and hyphens inside words), and
//! whitespace collapsed. Accent-only differences and small typos earn partial
//! credit.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DictationError {
    #[error("dictation needs at least one reference word")]
    NoReferences,

    #[error("reference at position {0} is empty after normalization")]
    EmptyReference(usize),

    #[error("dictation already completed")]
    Completed,
}

/// How closely an attempt matches its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationVerdict {
    Exact,
    /// Identical once diacritics are removed.
    AccentMismatch,
    /// Within the length-scaled edit distance tolerance.
    Typo { distance: usize },
    Incorrect,
}

impl DictationVerdict {
    /// Credit earned for this verdict, in `[0, 1]`.
    #[must_use]
    pub fn points(self) -> f32 {
        match self {
            DictationVerdict::Exact => 1.0,
            DictationVerdict::AccentMismatch | DictationVerdict::Typo { .. } => 0.5,
            DictationVerdict::Incorrect => 0.0,
        }
    }

    #[must_use]
    pub fn is_accepted(self) -> bool {
        !matches!(self, DictationVerdict::Incorrect)
    }
}

fn is_joiner(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2019}' | '-')
}

/// Canonical form used for comparison.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered: Vec<char> = text.nfc().flat_map(char::to_lowercase).collect();
    let mut out = String::with_capacity(lowered.len());

    for (i, &ch) in lowered.iter().enumerate() {
        if ch.is_alphanumeric() {
            out.push(ch);
            continue;
        }
        let inside_word = i > 0
            && lowered[i - 1].is_alphanumeric()
            && lowered.get(i + 1).is_some_and(|next| next.is_alphanumeric());
        if is_joiner(ch) && inside_word {
            out.push(if ch == '-' { '-' } else { '\'' });
        } else {
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip diacritics, e.g. "élève" becomes "eleve".
#[must_use]
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Character-level edit distance.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn typo_tolerance(reference: &str) -> usize {
    match reference.chars().count() {
        0..=1 => 0,
        2..=4 => 1,
        _ => 2,
    }
}

/// Compare an attempt against its reference word or phrase.
#[must_use]
pub fn compare(reference: &str, attempt: &str) -> DictationVerdict {
    let reference = normalize(reference);
    let attempt = normalize(attempt);
    if attempt.is_empty() || reference.is_empty() {
        return DictationVerdict::Incorrect;
    }
    if reference == attempt {
        return DictationVerdict::Exact;
    }

    let folded_reference = fold_accents(&reference);
    let folded_attempt = fold_accents(&attempt);
    if folded_reference == folded_attempt {
        return DictationVerdict::AccentMismatch;
    }

    let distance = levenshtein(&reference, &attempt);
    if distance <= typo_tolerance(&reference) {
        DictationVerdict::Typo { distance }
    } else {
        DictationVerdict::Incorrect
    }
}

/// Mean credit over `verdicts`; zero for an empty slice.
#[must_use]
pub fn score(verdicts: &[DictationVerdict]) -> f32 {
    if verdicts.is_empty() {
        return 0.0;
    }
    let total: f32 = verdicts.iter().map(|v| v.points()).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = verdicts.len() as f32;
    total / count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  Bonjour, le MONDE ! "), "bonjour le monde");
        assert_eq!(normalize("l’école"), "l'école");
        assert_eq!(normalize("peut-être"), "peut-être");
        assert_eq!(normalize("- oui -"), "oui");
    }

    #[test]
    fn normalize_composes_decomposed_accents() {
        let decomposed = "e\u{301}le\u{300}ve";
        assert_eq!(normalize(decomposed), "élève");
    }

    #[test]
    fn exact_after_normalization() {
        assert_eq!(compare("Bonjour", "bonjour!"), DictationVerdict::Exact);
        assert_eq!(compare("l'école", "L’école"), DictationVerdict::Exact);
    }

    #[test]
    fn accent_only_difference() {
        assert_eq!(compare("café", "cafe"), DictationVerdict::AccentMismatch);
        assert_eq!(compare("élève", "eleve"), DictationVerdict::AccentMismatch);
    }

    #[test]
    fn typo_tolerance_scales_with_length() {
        assert_eq!(compare("maison", "maisn"), DictationVerdict::Typo { distance: 1 });
        assert_eq!(compare("chat", "chats"), DictationVerdict::Typo { distance: 1 });
        assert_eq!(compare("a", "b"), DictationVerdict::Incorrect);
        assert_eq!(compare("chat", "chien"), DictationVerdict::Incorrect);
    }

    #[test]
    fn empty_attempt_is_incorrect() {
        assert_eq!(compare("maison", "  ?! "), DictationVerdict::Incorrect);
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("été", "ete"), 2);
    }

    #[test]
    fn score_averages_points() {
        let verdicts = [
            DictationVerdict::Exact,
            DictationVerdict::AccentMismatch,
            DictationVerdict::Incorrect,
            DictationVerdict::Exact,
        ];
        assert!((score(&verdicts) - 0.625).abs() < f32::EPSILON);
        assert!(score(&[]).abs() < f32::EPSILON);
    }
}
