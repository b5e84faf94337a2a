//! Label-driven section parsers.
//!
//! Each section is described by a static table of label → canonical field.
//! Tables are scanned in order and a later match overwrites an earlier one, so
//! when a line contains two synonyms the one listed last wins.
//!
//! Labels are matched by substring containment anywhere in the line, the way the
//! upstream template is rendered (`**Patient Name:** ...`, `* Name: ...`).

use std::collections::BTreeMap;

use super::types::{
    is_placeholder, MedicationField, NoteField, OtherNotes, PatientField, PatientInfo,
};

pub type LabelTable<F> = [(&'static str, F)];

pub const PATIENT_LABELS: &LabelTable<PatientField> = &[
    ("Patient Name:", PatientField::Name),
    ("Doctor Name:", PatientField::Doctor),
    ("Clinic/Hospital Name:", PatientField::Clinic),
    ("Hospital Name:", PatientField::Clinic),
    ("Clinic Name:", PatientField::Clinic),
    ("Address:", PatientField::Address),
    ("Date of Prescription:", PatientField::Date),
    ("Prescription Date:", PatientField::Date),
    ("Date:", PatientField::Date),
];

pub const NOTE_LABELS: &LabelTable<NoteField> = &[
    ("Refills:", NoteField::Refills),
    ("Refill:", NoteField::Refills),
    ("Label:", NoteField::Label),
    ("Special Instructions:", NoteField::SpecialInstructions),
    ("Pharmacy Instructions:", NoteField::PharmacyInstructions),
    ("Additional Notes:", NoteField::AdditionalNotes),
];

pub const MEDICATION_LABELS: &LabelTable<MedicationField> = &[
    ("Name:", MedicationField::Name),
    ("Medicine Name:", MedicationField::Name),
    ("Drug Name:", MedicationField::Name),
    ("Dosage:", MedicationField::Dosage),
    ("Dose:", MedicationField::Dosage),
    ("Strength:", MedicationField::Dosage),
    ("Frequency:", MedicationField::Frequency),
    ("Times per day:", MedicationField::Frequency),
    ("Duration:", MedicationField::Duration),
    ("Period:", MedicationField::Duration),
    ("Instructions:", MedicationField::Instructions),
    ("Directions:", MedicationField::Instructions),
    ("Notes:", MedicationField::Instructions),
];

/// Remove markdown emphasis and surrounding whitespace from an extracted value.
pub fn strip_emphasis(value: &str) -> String {
    value.replace('*', "").trim().to_string()
}

/// Value following the first occurrence of `label` in `line`, if usable.
pub fn value_after_label(line: &str, label: &str) -> Option<String> {
    let idx = line.find(label)?;
    let value = strip_emphasis(&line[idx + label.len()..]);
    (!value.is_empty() && !is_placeholder(&value)).then_some(value)
}

/// Report every label of `table` found in `line`, in table order.
pub fn scan_labels<F: Copy>(line: &str, table: &LabelTable<F>, mut sink: impl FnMut(F, String)) {
    for (label, field) in table {
        if let Some(value) = value_after_label(line, label) {
            sink(*field, value);
        }
    }
}

fn parse_section<F, S>(lines: &[S], table: &LabelTable<F>) -> BTreeMap<F, String>
where
    F: Copy + Ord,
    S: AsRef<str>,
{
    let mut fields = BTreeMap::new();
    for line in lines {
        scan_labels(line.as_ref().trim(), table, |field, value| {
            fields.insert(field, value);
        });
    }
    fields
}

/// Patient, prescriber and date block.
pub fn parse_patient_info<S: AsRef<str>>(lines: &[S]) -> PatientInfo {
    parse_section(lines, PATIENT_LABELS)
}

/// Refill / label / pharmacy notes block.
pub fn parse_other_notes<S: AsRef<str>>(lines: &[S]) -> OtherNotes {
    parse_section(lines, NOTE_LABELS)
}
