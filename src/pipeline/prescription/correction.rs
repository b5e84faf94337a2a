//! Medicine-name spell correction over the raw model text.
//!
//! Candidate names are harvested straight from the raw lines, corrected through
//! the lookup service, and written back into the text with whole-word,
//! case-insensitive replacement so that the second parse sees corrected names.
//! Lookup failures never escape: the original spelling is kept.

use std::sync::LazyLock;

use regex::{NoExpand, Regex, RegexBuilder};

use super::lookup::NameLookup;
use super::sections::{strip_emphasis, PATIENT_LABELS};
use super::types::is_placeholder;
use super::PrescriptionError;

/// Label carrying a medicine name in the medication bullets.
const NAME_LABEL: &str = "Name:";

/// Patient-info labels ending in `Name:`, matched with any run of spaces or
/// tabs between words since the section parsers see collapsed whitespace.
static PERSON_NAME_LABELS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PATIENT_LABELS
        .iter()
        .filter(|(label, _)| label.ends_with(NAME_LABEL))
        .map(|(label, _)| {
            let words: Vec<String> = label.split(' ').map(regex::escape).collect();
            Regex::new(&words.join(r"[ \t]+")).unwrap()
        })
        .collect()
});

/// Collect every medicine-name candidate in order of appearance, duplicates included.
///
/// A line qualifies when it has a `Name:` label that is not one of the
/// patient-info labels (`Patient Name:`, `Doctor Name:`, clinic names).
pub fn extract_candidate_names(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| line.contains(NAME_LABEL))
        .filter(|line| !PERSON_NAME_LABELS.iter().any(|label| label.is_match(line)))
        .filter_map(|line| {
            let idx = line.find(NAME_LABEL)?;
            let name = strip_emphasis(&line[idx + NAME_LABEL.len()..]);
            (!name.is_empty() && !is_placeholder(&name)).then_some(name)
        })
        .collect()
}

/// Corrected spelling for one name: the first suggestion, or the name itself
/// when nothing is suggested or the lookup fails.
pub async fn correct_one<L: NameLookup>(lookup: &L, name: &str, max_edit_distance: u32) -> String {
    match lookup.suggest(name, max_edit_distance).await {
        Ok(suggestions) => match suggestions.into_iter().next() {
            Some(s) if !s.term.trim().is_empty() => s.term,
            _ => name.to_string(),
        },
        Err(e) => {
            tracing::warn!(name, error = %e, "Medicine lookup failed, keeping original name");
            name.to_string()
        }
    }
}

/// Corrected spellings for all candidates, positionally paired with `names`.
///
/// No call for zero names, a single lookup for one, one batch call otherwise.
/// A batch answer of the wrong length, or a failed batch, falls back to
/// per-name lookups.
pub async fn spell_check<L: NameLookup>(
    lookup: &L,
    names: &[String],
    max_edit_distance: u32,
) -> Vec<String> {
    match names.len() {
        0 => Vec::new(),
        1 => vec![correct_one(lookup, &names[0], max_edit_distance).await],
        _ => match lookup.batch_suggest(names, max_edit_distance).await {
            Ok(corrected) if corrected.len() == names.len() => corrected
                .into_iter()
                .zip(names)
                .map(|(c, original)| {
                    if c.trim().is_empty() {
                        original.clone()
                    } else {
                        c
                    }
                })
                .collect(),
            Ok(corrected) => {
                tracing::warn!(
                    expected = names.len(),
                    received = corrected.len(),
                    "Batch lookup length mismatch, falling back to single lookups"
                );
                correct_each(lookup, names, max_edit_distance).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Batch lookup failed, falling back to single lookups");
                correct_each(lookup, names, max_edit_distance).await
            }
        },
    }
}

async fn correct_each<L: NameLookup>(
    lookup: &L,
    names: &[String],
    max_edit_distance: u32,
) -> Vec<String> {
    let mut corrected = Vec::with_capacity(names.len());
    for name in names {
        corrected.push(correct_one(lookup, name, max_edit_distance).await);
    }
    corrected
}

/// Whole-word, case-insensitive pattern for a literal name. Word boundaries are
/// only required on sides where the name starts/ends with a word character.
fn whole_word_pattern(name: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut pattern = String::new();
    if name.chars().next().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(name));
    if name.chars().last().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Rewrite `text`, replacing each original name whose correction differs.
///
/// Pairs are taken positionally; when `corrected` is shorter than `originals`
/// only the overlapping prefix is applied.
pub fn replace_names(
    text: &str,
    originals: &[String],
    corrected: &[String],
) -> Result<String, PrescriptionError> {
    let mut result = text.to_string();

    for (original, replacement) in originals.iter().zip(corrected) {
        if original == replacement || original.is_empty() || replacement.trim().is_empty() {
            continue;
        }

        let re = RegexBuilder::new(&whole_word_pattern(original))
            .case_insensitive(true)
            .build()
            .map_err(|e| PrescriptionError::InvalidPattern(e.to_string()))?;

        if re.is_match(&result) {
            result = re.replace_all(&result, NoExpand(replacement)).into_owned();
            tracing::info!(
                original = %original,
                corrected = %replacement,
                "Medicine name corrected"
            );
        }
    }

    Ok(result)
}
