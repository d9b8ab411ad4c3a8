//! Session ledger.
//!
//! The ledger maps `(gameId, fingerprint)` to the device's current session
//! key. It is read-only from the device's side; a rotation is recorded by the
//! submission service after it verifies the proof.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::identity::Fingerprint;

use super::retry::Transient;

/// Ledger lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Connection failure or timeout.
    #[error("ledger unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    /// Non-success HTTP status.
    #[error("ledger returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
    /// Response did not have the expected shape.
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl Transient for LedgerError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Malformed(_) => false,
        }
    }
}

/// Read access to current session records.
pub trait SessionLedger: Send + Sync {
    /// Current session value for a device in a game, `None` if absent.
    fn current_session(
        &self,
        game_id: u64,
        fingerprint: &Fingerprint,
    ) -> impl Future<Output = Result<Option<String>, LedgerError>> + Send;
}

/// Ledger backed by the session chain's GraphQL endpoint.
#[derive(Clone, Debug)]
pub struct GraphQlLedger {
    http: reqwest::Client,
    endpoint: Url,
}

impl GraphQlLedger {
    /// Client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LedgerError::Unreachable)?;
        Ok(Self { http, endpoint })
    }

    /// Endpoint being queried.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// GraphQL query for one session record.
///
/// Both values are rendered from integers, so inlining them is safe.
pub fn session_query(game_id: u64, fingerprint: &Fingerprint) -> String {
    format!(
        "query GetSession {{ runtime {{ DRM {{ sessions(key: {{ gameId: {{ value: \"{}\" }}, identifierHash: \"{}\" }}) {{ value }} }} }} }}",
        game_id,
        fingerprint.to_decimal()
    )
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<QueryData>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Deserialize)]
struct QueryData {
    runtime: RuntimeData,
}

#[derive(Deserialize)]
struct RuntimeData {
    #[serde(rename = "DRM")]
    drm: DrmData,
}

#[derive(Deserialize)]
struct DrmData {
    sessions: Option<SessionRecord>,
}

#[derive(Deserialize)]
struct SessionRecord {
    value: Option<String>,
}

/// Longest response body kept in errors.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

impl SessionLedger for GraphQlLedger {
    async fn current_session(
        &self,
        game_id: u64,
        fingerprint: &Fingerprint,
    ) -> Result<Option<String>, LedgerError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "query": session_query(game_id, fingerprint) }))
            .send()
            .await
            .map_err(LedgerError::Unreachable)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Status { status: status.as_u16(), body: truncate_body(body) });
        }

        let parsed: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))?;

        if let Some(first) = parsed.errors.first() {
            return Err(LedgerError::Malformed(first.message.clone()));
        }
        let data = parsed
            .data
            .ok_or_else(|| LedgerError::Malformed("response has no data".to_string()))?;

        let value = data.runtime.drm.sessions.and_then(|s| s.value);
        debug!(game_id, found = value.is_some(), "Ledger lookup complete");
        Ok(value)
    }
}

/// In-process ledger for tests and offline hosts.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: RwLock<BTreeMap<(u64, String), String>>,
}

impl InMemoryLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session value.
    pub async fn insert(&self, game_id: u64, fingerprint: &Fingerprint, value: impl Into<String>) {
        self.records
            .write()
            .await
            .insert((game_id, fingerprint.to_decimal()), value.into());
    }

    /// Number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the ledger holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl SessionLedger for InMemoryLedger {
    async fn current_session(
        &self,
        game_id: u64,
        fingerprint: &Fingerprint,
    ) -> Result<Option<String>, LedgerError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(game_id, fingerprint.to_decimal()))
            .cloned())
    }
}
