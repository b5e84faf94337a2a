//! Text normalizer for vision-model prescription output.
//!
//! The model is asked for a fixed template but frequently adds a chatty preamble,
//! mixes line endings, or pads fields with runs of spaces. `clean` reduces all of
//! that to one canonical multi-line string. It is idempotent:
//! `clean(&clean(x)) == clean(x)`.

use std::sync::LazyLock;

use regex::Regex;

/// First canonical label of the template, optionally emphasised with 1-3 `*`.
/// Whitespace inside the label is matched loosely so that a later whitespace
/// collapse cannot reveal a marker the first pass missed.
static START_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{0,3}Patient[ \t]+Name:").unwrap());

/// Introductory sentences the model likes to open with.
static AI_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^Here's[ \t]+the[ \t]+extracted[ \t]+information[ \t]+from[ \t]+the[ \t]+prescription[ \t]+image:\s*",
        r"(?i)^The[ \t]+extracted[ \t]+information[ \t]+from[ \t]+the[ \t]+prescription:\s*",
        r"(?i)^Extracted[ \t]+prescription[ \t]+details:\s*",
        r"(?i)^Based[ \t]+on[ \t]+the[ \t]+prescription[ \t]+image,[ \t]+here[ \t]+are[ \t]+the[ \t]+details:\s*",
        r"(?i)^Analysis[ \t]+of[ \t]+the[ \t]+prescription[ \t]+image:\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static EXCESS_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Normalize raw model output into canonical prescription text.
///
/// Never fails: empty or whitespace-only input yields an empty string.
pub fn clean(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let started = find_prescription_start(trimmed);
    let stripped = remove_ai_prefixes(started);
    normalize_whitespace(stripped)
}

/// Normalize, split into lines, trim each and drop empty ones.
pub fn extract_lines(text: &str) -> Vec<String> {
    clean(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop everything before the first start marker. Without a marker the text is
/// kept whole: over-including beats discarding real content.
fn find_prescription_start(text: &str) -> &str {
    match START_MARKER.find(text) {
        Some(m) => &text[m.start()..],
        None => text,
    }
}

/// Strip known boilerplate openers anchored at the very start, repeatedly, so a
/// second pass has nothing left to remove.
fn remove_ai_prefixes(text: &str) -> &str {
    let mut rest = text;
    loop {
        let before = rest.len();
        for prefix in AI_PREFIXES.iter() {
            if let Some(m) = prefix.find(rest) {
                rest = &rest[m.end()..];
            }
        }
        if rest.len() == before {
            return rest;
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = EXCESS_BLANK_LINES.replace_all(&unified, "\n\n");
    HORIZONTAL_WS
        .replace_all(&collapsed, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n\t  "), "");
        assert!(extract_lines("").is_empty());
    }

    #[test]
    fn discards_preamble_before_patient_name() {
        let raw = "Sure! I looked at the image carefully.\n\n**Patient Name:** John Doe\nDate: 2024-01-01";
        let cleaned = clean(raw);
        assert!(cleaned.starts_with("**Patient Name:** John Doe"));
        assert!(!cleaned.contains("Sure!"));
    }

    #[test]
    fn keeps_emphasis_markers_of_start_label() {
        assert!(clean("intro ***Patient Name: A").starts_with("***Patient Name: A"));
        assert!(clean("intro *Patient Name: A").starts_with("*Patient Name: A"));
        assert!(clean("intro Patient Name: A").starts_with("Patient Name: A"));
    }

    #[test]
    fn keeps_text_without_start_marker() {
        let raw = "Medication 1:\n* Name: Aspirin";
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn strips_known_prefixes_case_insensitively() {
        let raw = "HERE'S THE EXTRACTED INFORMATION FROM THE PRESCRIPTION IMAGE:\nMedication 1:";
        assert_eq!(clean(raw), "Medication 1:");

        let raw = "Extracted prescription details: Analysis of the prescription image: Rx: Aspirin";
        assert_eq!(clean(raw), "Rx: Aspirin");
    }

    #[test]
    fn prefix_only_removed_at_start() {
        let raw = "Rx: Aspirin\nExtracted prescription details: none";
        assert_eq!(clean(raw), raw);
    }

    #[test]
    fn normalizes_line_endings_and_blank_runs() {
        let raw = "Line one\r\nLine two\r\r\n\n\n\nLine three";
        assert_eq!(clean(raw), "Line one\nLine two\n\nLine three");
    }

    #[test]
    fn collapses_horizontal_whitespace() {
        assert_eq!(clean("Dosage:\t\t100mg   twice"), "Dosage: 100mg twice");
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "",
            "  plain text  ",
            "chatter\n\n\n\n**Patient Name:**   John\r\n\r\n\r\n\r\nDate:\t1/1",
            "Extracted  prescription\tdetails:   Patient  Name: A",
            "Analysis of the prescription image:\n\n\n\nExtracted prescription details: x",
            "Hello\n \n \n \nWorld",
            "intro Patient \t Name: Jane\n\t\n\n\n\n* Name: Aspirin",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn extract_lines_trims_and_drops_empties() {
        let raw = "**Patient Name:** John\n\n   * Name: Aspirin   \n \n* Dosage: 100mg";
        assert_eq!(
            extract_lines(raw),
            vec!["**Patient Name:** John", "* Name: Aspirin", "* Dosage: 100mg"]
        );
    }

    #[test]
    fn extract_lines_is_restartable() {
        let raw = "a\nb\n\nc";
        assert_eq!(extract_lines(raw), extract_lines(raw));
    }
}
