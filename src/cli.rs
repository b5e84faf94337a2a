//! Command-line front end: read prescription text, print the outcome as JSON.

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use crate::config::{self, LookupSettings};
use crate::pipeline::diagnostic;
use crate::pipeline::prescription::{
    FormatOutcome, MedicineApiClient, NameLookup, PassthroughLookup, PrescriptionError,
    PrescriptionParser,
};

#[derive(Parser, Debug)]
#[command(name = "medcipher")]
#[command(version = config::APP_VERSION)]
#[command(about = "Turn vision-model prescription text into a structured record")]
pub struct Cli {
    /// File holding the model output (stdin when omitted)
    pub input: Option<PathBuf>,

    /// Base URL of the medicine-name lookup service
    #[arg(long)]
    pub lookup_url: Option<String>,

    /// Edit-distance budget for name suggestions
    #[arg(long, default_value_t = config::DEFAULT_MAX_EDIT_DISTANCE)]
    pub max_edit_distance: u32,

    /// Parse without contacting the lookup service
    #[arg(long)]
    pub no_correction: bool,

    /// Error reported by the upstream vision model
    #[arg(long = "error", value_name = "MSG")]
    pub upstream_error: Option<String>,

    /// Only query the lookup service health endpoint
    #[arg(long, conflicts_with = "no_correction")]
    pub check_lookup: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Prescription(#[from] PrescriptionError),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

impl Cli {
    fn lookup_settings(&self) -> LookupSettings {
        let mut settings = LookupSettings::from_env();
        if let Some(url) = &self.lookup_url {
            settings.base_url = url.clone();
        }
        settings.max_edit_distance = self.max_edit_distance;
        settings
    }

    fn read_input(&self) -> Result<String, CliError> {
        match &self.input {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

fn with_dumps<L: NameLookup>(parser: PrescriptionParser<L>) -> PrescriptionParser<L> {
    match diagnostic::resolve_base_dir() {
        Some(base) => parser.with_diagnostic_dump(base),
        None => parser,
    }
}

fn write_json<T: Serialize, W: Write>(out: &mut W, value: &T, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Run one CLI invocation, writing JSON to `out`.
pub async fn execute<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
    let settings = cli.lookup_settings();

    if cli.check_lookup {
        let client = MedicineApiClient::from_settings(&settings)?;
        let health = client.health().await?;
        return write_json(out, &health, cli.pretty);
    }

    let raw = cli.read_input()?;
    let upstream_error = cli.upstream_error.as_deref();

    let outcome: FormatOutcome = if cli.no_correction {
        let parser = PrescriptionParser::new(PassthroughLookup)
            .with_max_edit_distance(settings.max_edit_distance);
        with_dumps(parser).format(&raw, upstream_error).await
    } else {
        let client = MedicineApiClient::from_settings(&settings)?;
        tracing::info!(lookup = client.base_url(), "Using medicine lookup service");
        let parser =
            PrescriptionParser::new(client).with_max_edit_distance(settings.max_edit_distance);
        with_dumps(parser).process(&raw, upstream_error).await
    };

    write_json(out, &outcome, cli.pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "medcipher",
            "scan.txt",
            "--lookup-url",
            "http://lookup:9000",
            "--max-edit-distance",
            "2",
            "--error",
            "model offline",
            "--pretty",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("scan.txt")));
        assert_eq!(cli.upstream_error.as_deref(), Some("model offline"));
        assert!(cli.pretty);
        assert!(!cli.no_correction);

        let settings = cli.lookup_settings();
        assert_eq!(settings.base_url, "http://lookup:9000");
        assert_eq!(settings.max_edit_distance, 2);
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["medcipher"]).unwrap();
        assert!(cli.input.is_none());
        assert_eq!(cli.max_edit_distance, config::DEFAULT_MAX_EDIT_DISTANCE);
    }

    #[test]
    fn check_lookup_conflicts_with_no_correction() {
        assert!(Cli::try_parse_from(["medcipher", "--check-lookup", "--no-correction"]).is_err());
    }

    #[tokio::test]
    async fn offline_run_prints_structured_json() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("scan.txt");
        std::fs::write(
            &input,
            "Here is what I see.\n**Patient Name:** John Doe\nMedications:\n* Name: Aspirin\n* Frequency: TID",
        )
        .unwrap();

        let cli = Cli::try_parse_from(["medcipher", input.to_str().unwrap(), "--no-correction"])
            .unwrap();
        let mut out = Vec::new();
        execute(&cli, &mut out).await.unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["kind"], "structured");
        assert_eq!(json["result"]["patientInfo"]["name"], "John Doe");
        assert_eq!(json["result"]["medications"][0]["frequency"], "3 times per day");
    }

    #[tokio::test]
    async fn upstream_error_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("empty.txt");
        std::fs::write(&input, "").unwrap();

        let cli = Cli::try_parse_from([
            "medcipher",
            input.to_str().unwrap(),
            "--no-correction",
            "--error",
            "vision model timed out",
        ])
        .unwrap();
        let mut out = Vec::new();
        execute(&cli, &mut out).await.unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["reason"]["reason"], "provided_error");
        assert_eq!(json["reason"]["detail"], "vision model timed out");
    }

    #[tokio::test]
    async fn missing_input_file_is_an_error() {
        let cli = Cli::try_parse_from(["medcipher", "/nonexistent/scan.txt", "--no-correction"])
            .unwrap();
        let err = execute(&cli, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
