//! Clinical frequency shorthand → readable phrase.
//!
//! Every spelling of one frequency (upper, lower, dotted, spelled out) maps to the
//! identical phrase, and no phrase contains a key as a whole word, so translating
//! twice is the same as translating once.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

/// Abbreviation variants and their canonical phrase, in substitution order.
const FREQUENCY_DICTIONARY: &[(&str, &str)] = &[
    // Basic frequency terms
    ("BID", "2 times per day"),
    ("TID", "3 times per day"),
    ("QID", "4 times per day"),
    ("QD", "1 time per day"),
    ("QOD", "Every other day"),
    ("PRN", "As needed"),
    ("AC", "Before meals"),
    ("PC", "After meals"),
    ("HS", "At bedtime"),
    ("Q4H", "Every 4 hours"),
    ("Q6H", "Every 6 hours"),
    ("Q8H", "Every 8 hours"),
    ("Q12H", "Every 12 hours"),
    ("QAM", "Every morning"),
    ("QPM", "Every evening"),
    ("STAT", "Immediately"),
    // Case variations
    ("bid", "2 times per day"),
    ("tid", "3 times per day"),
    ("qid", "4 times per day"),
    ("qd", "1 time per day"),
    ("qod", "Every other day"),
    ("prn", "As needed"),
    ("ac", "Before meals"),
    ("pc", "After meals"),
    ("hs", "At bedtime"),
    ("q4h", "Every 4 hours"),
    ("q6h", "Every 6 hours"),
    ("q8h", "Every 8 hours"),
    ("q12h", "Every 12 hours"),
    ("qam", "Every morning"),
    ("qpm", "Every evening"),
    ("stat", "Immediately"),
    // Punctuated
    ("b.i.d", "2 times per day"),
    ("t.i.d", "3 times per day"),
    ("q.i.d", "4 times per day"),
    ("q.d", "1 time per day"),
    ("q.o.d", "Every other day"),
    ("p.r.n", "As needed"),
    ("a.c", "Before meals"),
    ("p.c", "After meals"),
    ("h.s", "At bedtime"),
    // Spelled out
    ("2x daily", "2 times per day"),
    ("3x daily", "3 times per day"),
    ("4x daily", "4 times per day"),
    ("1x daily", "1 time per day"),
    ("twice daily", "2 times per day"),
    ("three times daily", "3 times per day"),
    ("four times daily", "4 times per day"),
    ("once daily", "1 time per day"),
    ("twice a day", "2 times per day"),
    ("three times a day", "3 times per day"),
    ("four times a day", "4 times per day"),
    ("once a day", "1 time per day"),
];

/// Whole-word, case-insensitive matcher per key (dots matched literally).
static KEY_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    FREQUENCY_DICTIONARY
        .iter()
        .map(|(key, phrase)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(key));
            (Regex::new(&pattern).unwrap(), *phrase)
        })
        .collect()
});

/// Read-only view of every (variant, phrase) pair.
pub fn dictionary() -> &'static [(&'static str, &'static str)] {
    FREQUENCY_DICTIONARY
}

fn exact_match(text: &str) -> Option<&'static str> {
    let needle = text.trim();
    FREQUENCY_DICTIONARY
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(needle))
        .map(|(_, phrase)| *phrase)
}

/// Translate a frequency field.
///
/// Whole-string match first; otherwise every embedded whole-word key is replaced.
/// Unmapped input comes back unchanged.
pub fn translate_frequency(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    if let Some(phrase) = exact_match(text) {
        return phrase.to_string();
    }

    let mut translated = text.to_string();
    for (pattern, phrase) in KEY_PATTERNS.iter() {
        if pattern.is_match(&translated) {
            translated = pattern
                .replace_all(&translated, NoExpand(phrase))
                .into_owned();
        }
    }
    translated
}

/// Whether the whole term is a known variant.
pub fn has_translation(term: &str) -> bool {
    !term.trim().is_empty() && exact_match(term).is_some()
}

/// Every dictionary variant meaning the same as `frequency`.
pub fn variations(frequency: &str) -> Vec<&'static str> {
    let target = translate_frequency(frequency);
    FREQUENCY_DICTIONARY
        .iter()
        .filter(|(_, phrase)| *phrase == target)
        .map(|(key, _)| *key)
        .collect()
}
