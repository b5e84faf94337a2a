pub mod types;
pub mod normalize;
pub mod frequency;
pub mod sections;
pub mod medication;
pub mod validation;
pub mod lookup;
pub mod correction;
pub mod orchestrator;

pub use types::*;
pub use normalize::{clean, extract_lines};
pub use frequency::{has_translation, translate_frequency, variations};
pub use sections::{parse_other_notes, parse_patient_info};
pub use medication::parse_medications;
pub use validation::validate;
pub use lookup::*;
pub use orchestrator::*;

use thiserror::Error;

/// Infrastructure failures. Content problems never surface here: malformed
/// prescription text degrades to empty sections instead.
#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Medicine lookup service is not reachable at {0}")]
    LookupConnection(String),

    #[error("Medicine lookup returned error (status {status}): {body}")]
    LookupStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Invalid replacement pattern: {0}")]
    InvalidPattern(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_has_a_message() {
        let errors = [
            PrescriptionError::LookupConnection("http://127.0.0.1:5000".into()),
            PrescriptionError::LookupStatus {
                status: 503,
                body: "warming up".into(),
            },
            PrescriptionError::HttpClient("timed out".into()),
            PrescriptionError::ResponseParsing("expected array".into()),
            PrescriptionError::InvalidPattern("too big".into()),
        ];
        for err in &errors {
            let expected_detail = match err {
                PrescriptionError::LookupConnection(url) => url.as_str(),
                PrescriptionError::LookupStatus { body, .. } => body.as_str(),
                PrescriptionError::HttpClient(msg)
                | PrescriptionError::ResponseParsing(msg)
                | PrescriptionError::InvalidPattern(msg) => msg.as_str(),
            };
            assert!(err.to_string().contains(expected_detail), "{err}");
        }
        assert_eq!(
            errors[1].to_string(),
            "Medicine lookup returned error (status 503): warming up"
        );
    }
}
