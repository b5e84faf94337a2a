use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Values the vision model writes when a field could not be read.
pub const PLACEHOLDERS: &[&str] = &["Not visible", "N/A"];

/// Placeholder that makes a medication name unusable.
pub const NAME_PLACEHOLDER: &str = "Not visible";

/// Returned verbatim by the vision model when the image is not a prescription.
pub const NOT_A_PRESCRIPTION_SENTINEL: &str = "ERROR: Image is not a readable prescription";

pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS.contains(&value)
}

// ═══════════════════════════════════════════════════════════
// Section fields
// ═══════════════════════════════════════════════════════════

/// Canonical patient-info fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatientField {
    Name,
    Doctor,
    Clinic,
    Address,
    Date,
}

/// Canonical other-notes fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteField {
    Refills,
    Label,
    SpecialInstructions,
    PharmacyInstructions,
    AdditionalNotes,
}

/// Canonical medication fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MedicationField {
    Name,
    Dosage,
    Frequency,
    Duration,
    Instructions,
}

/// Field name → extracted value. Absent fields are missing keys, never empty strings.
pub type PatientInfo = BTreeMap<PatientField, String>;

/// Same contract as [`PatientInfo`], for the notes block.
pub type OtherNotes = BTreeMap<NoteField, String>;

// ═══════════════════════════════════════════════════════════
// Medication
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Medication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Medication {
    pub fn set(&mut self, field: MedicationField, value: String) {
        let slot = match field {
            MedicationField::Name => &mut self.name,
            MedicationField::Dosage => &mut self.dosage,
            MedicationField::Frequency => &mut self.frequency,
            MedicationField::Duration => &mut self.duration,
            MedicationField::Instructions => &mut self.instructions,
        };
        *slot = Some(value);
    }

    /// A medication is usable once it has a non-empty, non-placeholder name.
    pub fn is_valid(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty() && n != NAME_PLACEHOLDER)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ═══════════════════════════════════════════════════════════
// Aggregates
// ═══════════════════════════════════════════════════════════

/// Everything recovered from one prescription text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub patient_info: PatientInfo,
    pub medications: Vec<Medication>,
    pub other_notes: OtherNotes,
}

/// Which sections produced anything, and whether that is enough to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub has_patient_info: bool,
    pub has_medications: bool,
    pub has_other_notes: bool,
}

/// Raw and cleaned text plus whatever was recovered, for inspecting template drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticBundle {
    pub raw_text: String,
    pub cleaned_text: String,
    pub partial: ParseResult,
}

/// Why a text was turned away before section parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The caller already had an error from upstream.
    ProvidedError(String),
    EmptyInput,
    NotAPrescription,
    CleaningFailed,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProvidedError(msg) => write!(f, "{msg}"),
            Self::EmptyInput => write!(f, "No prescription text provided"),
            Self::NotAPrescription => {
                write!(f, "The uploaded image is not a readable prescription")
            }
            Self::CleaningFailed => write!(f, "Could not clean prescription text"),
        }
    }
}

/// What the rendering collaborator receives for one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatOutcome {
    Structured { result: ParseResult },
    Diagnostic { bundle: DiagnosticBundle },
    Rejected { reason: RejectionReason },
}

impl FormatOutcome {
    pub fn result(&self) -> Option<&ParseResult> {
        match self {
            Self::Structured { result } => Some(result),
            Self::Diagnostic { bundle } => Some(&bundle.partial),
            Self::Rejected { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medication_validity() {
        let mut med = Medication::default();
        assert!(!med.is_valid());
        med.set(MedicationField::Name, "   ".into());
        assert!(!med.is_valid());
        med.set(MedicationField::Name, "Not visible".into());
        assert!(!med.is_valid());
        med.set(MedicationField::Name, "Aspirin".into());
        assert!(med.is_valid());
    }

    #[test]
    fn medication_without_name_is_invalid() {
        let mut med = Medication::default();
        med.set(MedicationField::Dosage, "100mg".into());
        assert!(!med.is_valid());
        assert!(!med.is_empty());
    }

    #[test]
    fn parse_result_serializes_camel_case_keys() {
        let mut result = ParseResult::default();
        result
            .other_notes
            .insert(NoteField::SpecialInstructions, "Shake well".into());
        result.patient_info.insert(PatientField::Name, "John Doe".into());
        result.medications.push(Medication {
            name: Some("Aspirin".into()),
            ..Default::default()
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["patientInfo"]["name"], "John Doe");
        assert_eq!(json["otherNotes"]["specialInstructions"], "Shake well");
        assert_eq!(json["medications"][0]["name"], "Aspirin");
        assert!(json["medications"][0].get("dosage").is_none());
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(
            RejectionReason::NotAPrescription.to_string(),
            "The uploaded image is not a readable prescription"
        );
        assert_eq!(
            RejectionReason::ProvidedError("upstream down".into()).to_string(),
            "upstream down"
        );
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = FormatOutcome::Rejected {
            reason: RejectionReason::EmptyInput,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["reason"]["reason"], "empty_input");
        assert!(outcome.result().is_none());
    }

    #[test]
    fn placeholders_recognized() {
        assert!(is_placeholder("Not visible"));
        assert!(is_placeholder("N/A"));
        assert!(!is_placeholder("n/a tablets"));
    }
}
