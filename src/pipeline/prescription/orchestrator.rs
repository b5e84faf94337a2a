use std::path::PathBuf;

use tracing::Instrument;

use super::correction::{extract_candidate_names, replace_names, spell_check};
use super::lookup::NameLookup;
use super::medication::parse_medications;
use super::normalize::{clean, extract_lines};
use super::sections::{parse_other_notes, parse_patient_info};
use super::types::{
    DiagnosticBundle, FormatOutcome, ParseResult, RejectionReason, NOT_A_PRESCRIPTION_SENTINEL,
};
use super::validation::validate_result;
use super::PrescriptionError;
use crate::config::DEFAULT_MAX_EDIT_DISTANCE;
use crate::pipeline::diagnostic;

/// Orchestrates the prescription pipeline:
/// screen → (correct names → re-parse) → validate → structured or diagnostic outcome
pub struct PrescriptionParser<L> {
    lookup: L,
    max_edit_distance: u32,
    dump_dir: Option<PathBuf>,
}

impl<L: NameLookup> PrescriptionParser<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            dump_dir: None,
        }
    }

    pub fn with_max_edit_distance(mut self, max_edit_distance: u32) -> Self {
        self.max_edit_distance = max_edit_distance;
        self
    }

    /// Write diagnostic bundles under `base` whenever nothing could be recovered.
    pub fn with_diagnostic_dump(mut self, base: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(base.into());
        self
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// One pass over `text`: normalize, then patient info, medications (via the
    /// cascade, with name lookup and frequency translation) and notes.
    pub async fn parse(&self, text: &str) -> ParseResult {
        let lines = extract_lines(text);
        let cleaned = clean(text);

        let patient_info = parse_patient_info(&lines);
        let medications =
            parse_medications(&lines, &cleaned, &self.lookup, self.max_edit_distance).await;
        let other_notes = parse_other_notes(&lines);

        ParseResult {
            patient_info,
            medications,
            other_notes,
        }
    }

    /// Raw text with every misspelled medicine name replaced by its correction.
    pub async fn corrected_text(&self, raw: &str) -> Result<String, PrescriptionError> {
        let candidates = extract_candidate_names(raw);
        tracing::debug!(count = candidates.len(), "Medicine name candidates harvested");

        let corrected = spell_check(&self.lookup, &candidates, self.max_edit_distance).await;
        replace_names(raw, &candidates, &corrected)
    }

    /// Parse, correct names in the raw text, and parse the corrected text again.
    ///
    /// If the correction pass fails the uncorrected result is returned instead.
    pub async fn correct_and_reparse(&self, raw: &str) -> ParseResult {
        let span = tracing::info_span!("correct_and_reparse", raw_len = raw.len());
        async {
            let initial = self.parse(raw).await;

            match self.corrected_text(raw).await {
                Ok(corrected) => self.parse(&corrected).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Name correction failed, using uncorrected result");
                    initial
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Recognized error branches checked before any section parsing.
    pub fn screen(raw: &str, error_message: Option<&str>) -> Option<RejectionReason> {
        if let Some(msg) = error_message.filter(|m| !m.trim().is_empty()) {
            return Some(RejectionReason::ProvidedError(msg.to_string()));
        }
        if raw.trim().is_empty() {
            return Some(RejectionReason::EmptyInput);
        }
        if raw.contains(NOT_A_PRESCRIPTION_SENTINEL) {
            return Some(RejectionReason::NotAPrescription);
        }
        if clean(raw).is_empty() {
            return Some(RejectionReason::CleaningFailed);
        }
        None
    }

    /// Screen, parse once and build the outcome. No name correction pass.
    pub async fn format(&self, raw: &str, error_message: Option<&str>) -> FormatOutcome {
        let span = tracing::info_span!("format", raw_len = raw.len());
        async {
            if let Some(reason) = Self::screen(raw, error_message) {
                tracing::info!(%reason, "Prescription rejected");
                return FormatOutcome::Rejected { reason };
            }
            let result = self.parse(raw).await;
            self.assemble(raw, result)
        }
        .instrument(span)
        .await
    }

    /// Screen, run the correction round-trip and build the outcome.
    pub async fn process(&self, raw: &str, error_message: Option<&str>) -> FormatOutcome {
        if let Some(reason) = Self::screen(raw, error_message) {
            tracing::info!(%reason, "Prescription rejected");
            return FormatOutcome::Rejected { reason };
        }
        let result = self.correct_and_reparse(raw).await;
        self.assemble(raw, result)
    }

    fn assemble(&self, raw: &str, result: ParseResult) -> FormatOutcome {
        let validation = validate_result(&result);
        if validation.is_valid {
            return FormatOutcome::Structured { result };
        }

        let bundle = DiagnosticBundle {
            raw_text: raw.to_string(),
            cleaned_text: clean(raw),
            partial: result,
        };
        tracing::warn!("No prescription section recovered, returning diagnostic bundle");

        if let Some(base) = &self.dump_dir {
            diagnostic::dump_bundle(base, &bundle);
        }
        FormatOutcome::Diagnostic { bundle }
    }
}
