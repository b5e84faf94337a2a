//! Medication extraction cascade.
//!
//! Three strategies of increasing laxity share one signature and are tried in
//! order; the first one yielding at least one valid medication wins and the
//! rest are never run:
//!
//! 1. `parse_from_lines`: line state machine over the medication section
//! 2. `parse_from_pattern`: one structured pattern per `**Medication N:**` block
//! 3. `parse_from_blocks`: split on block headers, scan each chunk for labels
//!
//! Strategies are pure. Name correction and frequency translation happen once,
//! afterwards, on the winning strategy's output, in source order.

use std::sync::LazyLock;

use regex::Regex;

use super::correction::correct_one;
use super::frequency::translate_frequency;
use super::lookup::NameLookup;
use super::sections::{scan_labels, MEDICATION_LABELS};
use super::types::{is_placeholder, Medication};

/// Signature shared by every extraction strategy: (lines, text) → medications.
pub type Strategy = fn(&[String], &str) -> Vec<Medication>;

/// Cascade order used by the parser.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("line_state_machine", parse_from_lines),
    ("medication_pattern", parse_from_pattern),
    ("block_split", parse_from_blocks),
];

const SECTION_START_MARKERS: &[&str] = &[
    "Medication(s):",
    "Medications:",
    "Prescribed Medications:",
    "Rx:",
    "Prescriptions:",
];

const SECTION_END_MARKERS: &[&str] = &[
    "Other Notes/Instructions:",
    "Additional Instructions:",
    "Refill Information:",
    "Pharmacy Notes:",
    "Doctor Notes:",
];

static NEW_MEDICATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Medication|Medicine|Rx) \d+:|^\d+[.)]").unwrap());

static MEDICATION_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\*\*Medication \d+:\*\*\s*",
        r"(?:\*\s*(?:Name|Medicine Name|Drug Name):\s*([^\n*]+))?\s*",
        r"(?:\*\s*(?:Dosage|Dose|Strength):\s*([^\n*]+))?\s*",
        r"(?:\*\s*(?:Frequency|Times per day):\s*([^\n*]+))?\s*",
        r"(?:\*\s*(?:Duration|Period):\s*([^\n*]+))?\s*",
        r"(?:\*\s*(?:Instructions|Directions|Notes):\s*([^\n*]+))?",
    ))
    .unwrap()
});

static BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Medication \d+:\*\*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    Outside,
    InsideMedications,
}

fn is_section_start(line: &str) -> bool {
    SECTION_START_MARKERS.iter().any(|m| line.contains(m))
}

fn is_section_end(line: &str) -> bool {
    SECTION_END_MARKERS.iter().any(|m| line.contains(m))
}

fn is_new_medication(line: &str) -> bool {
    NEW_MEDICATION.is_match(line)
}

/// Merge every medication label found in `line` into `medication`.
fn merge_fields(line: &str, medication: &mut Medication) {
    scan_labels(line, MEDICATION_LABELS, |field, value| medication.set(field, value));
}

fn take_if_valid(current: &mut Medication, out: &mut Vec<Medication>) -> bool {
    if current.is_valid() {
        out.push(std::mem::take(current));
        true
    } else {
        false
    }
}

// ═══════════════════════════════════════════════════════════
// Strategies
// ═══════════════════════════════════════════════════════════

/// Strategy 1: walk the lines, tracking whether we are inside the medication section.
pub fn parse_from_lines(lines: &[String], _text: &str) -> Vec<Medication> {
    let mut medications = Vec::new();
    let mut current = Medication::default();
    let mut state = SectionState::Outside;

    for line in lines {
        let line = line.trim();

        if is_section_start(line) {
            state = SectionState::InsideMedications;
            continue;
        }

        if is_section_end(line) {
            state = SectionState::Outside;
            take_if_valid(&mut current, &mut medications);
            continue;
        }

        if state == SectionState::InsideMedications {
            if is_new_medication(line) {
                take_if_valid(&mut current, &mut medications);
                current = Medication::default();
            }
            merge_fields(line, &mut current);
        }
    }

    take_if_valid(&mut current, &mut medications);
    medications
}

/// Strategy 2: one positional pattern per `**Medication N:**` block of the text.
pub fn parse_from_pattern(_lines: &[String], text: &str) -> Vec<Medication> {
    MEDICATION_BLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let field = |i: usize| {
                caps.get(i)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|v| !v.is_empty() && !is_placeholder(v))
            };
            let medication = Medication {
                name: field(1),
                dosage: field(2),
                frequency: field(3),
                duration: field(4),
                instructions: field(5),
            };
            medication.is_valid().then_some(medication)
        })
        .collect()
}

/// Strategy 3: split on block headers and label-scan every line of each chunk.
pub fn parse_from_blocks(_lines: &[String], text: &str) -> Vec<Medication> {
    BLOCK_HEADER
        .split(text)
        .skip(1)
        .filter_map(|block| {
            let mut medication = Medication::default();
            for line in block.split('\n') {
                merge_fields(line.trim(), &mut medication);
            }
            medication.is_valid().then_some(medication)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Cascade
// ═══════════════════════════════════════════════════════════

/// Run `strategies` in order and return the first non-empty result with the
/// strategy's name. Later strategies are not invoked once one succeeds.
pub fn run_cascade(
    strategies: &[(&'static str, Strategy)],
    lines: &[String],
    text: &str,
) -> Option<(&'static str, Vec<Medication>)> {
    strategies.iter().find_map(|(name, strategy)| {
        let found = strategy(lines, text);
        if found.is_empty() {
            tracing::debug!(strategy = name, "Medication strategy found nothing");
            None
        } else {
            Some((*name, found))
        }
    })
}

/// Correct the name through the lookup and translate the frequency.
pub async fn finalize_medication<L: NameLookup>(
    mut medication: Medication,
    lookup: &L,
    max_edit_distance: u32,
) -> Medication {
    if let Some(name) = medication.name.take() {
        medication.name = Some(correct_one(lookup, &name, max_edit_distance).await);
    }
    if let Some(frequency) = medication.frequency.take() {
        medication.frequency = Some(translate_frequency(&frequency));
    }
    medication
}

/// Extract medications with the default cascade and finalize them in order.
pub async fn parse_medications<L: NameLookup>(
    lines: &[String],
    text: &str,
    lookup: &L,
    max_edit_distance: u32,
) -> Vec<Medication> {
    parse_medications_with(STRATEGIES, lines, text, lookup, max_edit_distance).await
}

pub async fn parse_medications_with<L: NameLookup>(
    strategies: &[(&'static str, Strategy)],
    lines: &[String],
    text: &str,
    lookup: &L,
    max_edit_distance: u32,
) -> Vec<Medication> {
    let Some((strategy, drafts)) = run_cascade(strategies, lines, text) else {
        tracing::info!("No medications recovered by any strategy");
        return Vec::new();
    };
    tracing::info!(strategy, count = drafts.len(), "Medications extracted");

    let mut medications = Vec::with_capacity(drafts.len());
    for draft in drafts {
        medications.push(finalize_medication(draft, lookup, max_edit_distance).await);
    }
    medications
}
