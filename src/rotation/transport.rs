//! Proof transport.
//!
//! Delivers a serialized rotation proof to the submission service, which
//! verifies it and records the new session on the ledger.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;
use tracing::debug;
use url::Url;

use super::ledger::truncate_body;
use super::retry::Transient;

/// Submission path appended to the service base URL.
pub const SUBMIT_PATH: &str = "submit-session";

/// Submission errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failure or timeout.
    #[error("submission service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    /// Service answered with a non-success status.
    #[error("submission rejected with HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
    /// Submission URL could not be built.
    #[error("invalid submission URL: {0}")]
    Encode(String),
    /// In-process recorder lock was poisoned by a panicking holder.
    #[error("submission recorder unavailable: {0}")]
    Recorder(String),
}

impl Transient for TransportError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::Encode(_) | Self::Recorder(_) => false,
        }
    }
}

/// Delivers proof payloads.
pub trait ProofTransport: Send + Sync {
    /// Submit a JSON payload produced by [`crate::proof::serialize`].
    fn submit(&self, payload: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// HTTP transport: `POST <base>/submit-session` with `{"proof": "<payload>"}`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Transport for the service at `base`, with a per-request timeout.
    pub fn new(base: &Url, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = submit_endpoint(base)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Unreachable)?;
        Ok(Self { http, endpoint })
    }

    /// Full submission URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `<base>/submit-session`, keeping any path prefix on `base`.
pub fn submit_endpoint(base: &Url) -> Result<Url, TransportError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(SUBMIT_PATH).map_err(|e| TransportError::Encode(e.to_string()))
}

impl ProofTransport for HttpTransport {
    async fn submit(&self, payload: &str) -> Result<(), TransportError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "proof": payload }))
            .send()
            .await
            .map_err(TransportError::Unreachable)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Rejected { status: status.as_u16(), body: truncate_body(body) });
        }
        debug!(status = status.as_u16(), "Proof submitted");
        Ok(())
    }
}

/// Transport that records payloads instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    submitted: Mutex<Vec<String>>,
}

impl RecordingTransport {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads submitted so far.
    pub fn submissions(&self) -> Result<Vec<String>, TransportError> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .map_err(|e| TransportError::Recorder(e.to_string()))
    }
}

impl ProofTransport for RecordingTransport {
    async fn submit(&self, payload: &str) -> Result<(), TransportError> {
        self.submitted
            .lock()
            .map_err(|e| TransportError::Recorder(e.to_string()))?
            .push(payload.to_string());
        Ok(())
    }
}
