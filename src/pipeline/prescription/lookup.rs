//! Medicine-name lookup collaborator.
//!
//! The spelling service is external; this module only consumes its HTTP
//! contract. `NameLookup` is the seam the parser depends on, with an HTTP
//! implementation, a pass-through for offline runs, and a configurable mock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::PrescriptionError;
use crate::config::LookupSettings;

/// One ranked suggestion for a looked-up term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub term: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub term: String,
    #[serde(default)]
    pub confidence: f32,
}

/// Health report from the lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupHealth {
    pub status: String,
    #[serde(default)]
    pub symspell_initialized: bool,
    #[serde(default)]
    pub symspell_dictionary_size: u64,
}

/// Spelling lookup for medicine names.
pub trait NameLookup: Send + Sync {
    /// Ranked suggestions for one term; empty when nothing is close enough.
    fn suggest(
        &self,
        term: &str,
        max_edit_distance: u32,
    ) -> impl Future<Output = Result<Vec<Suggestion>, PrescriptionError>> + Send;

    /// One corrected string per input term, in order. An empty string means
    /// no match for that term.
    fn batch_suggest(
        &self,
        terms: &[String],
        max_edit_distance: u32,
    ) -> impl Future<Output = Result<Vec<String>, PrescriptionError>> + Send;
}

// ═══════════════════════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
struct SuggestRequest<'a> {
    term: &'a str,
    max_edit_distance: u32,
}

#[derive(Serialize)]
struct BatchSuggestRequest<'a> {
    terms: &'a [String],
    max_edit_distance: u32,
}

/// HTTP client for the medicine spelling service.
pub struct MedicineApiClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl MedicineApiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, PrescriptionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PrescriptionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_settings(settings: &LookupSettings) -> Result<Self, PrescriptionError> {
        Self::new(&settings.base_url, settings.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> PrescriptionError {
        if e.is_connect() {
            PrescriptionError::LookupConnection(self.base_url.clone())
        } else if e.is_timeout() {
            PrescriptionError::HttpClient(format!(
                "Request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            PrescriptionError::HttpClient(e.to_string())
        }
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, PrescriptionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrescriptionError::LookupStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PrescriptionError::ResponseParsing(e.to_string()))
    }

    /// GET /health
    pub async fn health(&self) -> Result<LookupHealth, PrescriptionError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::read_json(response).await
    }
}

impl NameLookup for MedicineApiClient {
    async fn suggest(
        &self,
        term: &str,
        max_edit_distance: u32,
    ) -> Result<Vec<Suggestion>, PrescriptionError> {
        let url = format!("{}/suggest_medicine", self.base_url);
        let body = SuggestRequest {
            term,
            max_edit_distance,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let suggestions: Vec<Suggestion> = Self::read_json(response).await?;
        tracing::debug!(
            term,
            suggested = suggestions.first().map(|s| s.term.as_str()),
            "Medicine suggestion received"
        );
        Ok(suggestions)
    }

    async fn batch_suggest(
        &self,
        terms: &[String],
        max_edit_distance: u32,
    ) -> Result<Vec<String>, PrescriptionError> {
        let url = format!("{}/batch_suggest", self.base_url);
        let body = BatchSuggestRequest {
            terms,
            max_edit_distance,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::read_json(response).await
    }
}

// ═══════════════════════════════════════════════════════════
// Offline + mock implementations
// ═══════════════════════════════════════════════════════════

/// Lookup that never suggests anything. Used when correction is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughLookup;

impl NameLookup for PassthroughLookup {
    async fn suggest(&self, _term: &str, _max: u32) -> Result<Vec<Suggestion>, PrescriptionError> {
        Ok(Vec::new())
    }

    async fn batch_suggest(
        &self,
        terms: &[String],
        _max: u32,
    ) -> Result<Vec<String>, PrescriptionError> {
        Ok(terms.to_vec())
    }
}

/// How the mock answers batch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchBehavior {
    /// One answer per term.
    #[default]
    Normal,
    /// Drops the last answer (malformed response).
    Truncated,
    /// Returns an error.
    Fail,
}

/// Mock lookup for testing: a fixed misspelling → correction table.
#[derive(Debug, Default)]
pub struct MockNameLookup {
    corrections: HashMap<String, String>,
    fail_single: bool,
    batch: BatchBehavior,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    seen_terms: Mutex<Vec<String>>,
}

impl MockNameLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correction(mut self, misspelled: &str, corrected: &str) -> Self {
        self.corrections
            .insert(misspelled.to_string(), corrected.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_single = true;
        self.batch = BatchBehavior::Fail;
        self
    }

    pub fn with_batch(mut self, batch: BatchBehavior) -> Self {
        self.batch = batch;
        self
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Terms passed to single lookups, in call order.
    pub fn seen_terms(&self) -> Vec<String> {
        self.seen_terms
            .lock()
            .map(|terms| terms.clone())
            .unwrap_or_default()
    }

    fn correction_for(&self, term: &str) -> Option<&String> {
        self.corrections.get(term)
    }
}

impl NameLookup for MockNameLookup {
    async fn suggest(&self, term: &str, _max: u32) -> Result<Vec<Suggestion>, PrescriptionError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_terms.lock() {
            seen.push(term.to_string());
        }
        if self.fail_single {
            return Err(PrescriptionError::LookupConnection("mock".into()));
        }
        Ok(self
            .correction_for(term)
            .map(|corrected| {
                vec![Suggestion {
                    term: corrected.clone(),
                    confidence: 0.9,
                    method: Some("mock".into()),
                    alternatives: Vec::new(),
                }]
            })
            .unwrap_or_default())
    }

    async fn batch_suggest(
        &self,
        terms: &[String],
        _max: u32,
    ) -> Result<Vec<String>, PrescriptionError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut answers: Vec<String> = terms
            .iter()
            .map(|t| self.correction_for(t).cloned().unwrap_or_default())
            .collect();
        match self.batch {
            BatchBehavior::Normal => Ok(answers),
            BatchBehavior::Truncated => {
                answers.pop();
                Ok(answers)
            }
            BatchBehavior::Fail => Err(PrescriptionError::LookupStatus {
                status: 500,
                body: "mock failure".into(),
            }),
        }
    }
}
