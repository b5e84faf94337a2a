use super::types::{Medication, OtherNotes, ParseResult, PatientInfo, ValidationOutcome};

/// Report which sections produced anything. A result is renderable as soon as
/// at least one section is non-empty.
pub fn validate(
    patient_info: &PatientInfo,
    medications: &[Medication],
    other_notes: &OtherNotes,
) -> ValidationOutcome {
    let has_patient_info = !patient_info.is_empty();
    let has_medications = !medications.is_empty();
    let has_other_notes = !other_notes.is_empty();

    let outcome = ValidationOutcome {
        is_valid: has_patient_info || has_medications || has_other_notes,
        has_patient_info,
        has_medications,
        has_other_notes,
    };
    tracing::debug!(
        is_valid = outcome.is_valid,
        has_patient_info,
        has_medications,
        has_other_notes,
        "Prescription validated"
    );
    outcome
}

pub fn validate_result(result: &ParseResult) -> ValidationOutcome {
    validate(&result.patient_info, &result.medications, &result.other_notes)
}
