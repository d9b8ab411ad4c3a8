//! Rotation Orchestrator
//!
//! Runs one session rotation end to end:
//!
//! ```text
//! identifiers ─► canonicalize ─► fingerprint ─► ledger lookup ─► pick key
//!                                                     │
//!                     submit ◄─ serialize ◄─ prove ◄──┘
//! ```
//!
//! Ledger lookup and submission retry transient failures with backoff.
//! Proving is never retried. The whole rotation runs under one deadline.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::identity::{canonicalize, fingerprint, Fingerprint, IdentifierError};
use crate::proof::pipeline::{serialize, ProofError};
use crate::proof::prover::Prover;
use crate::proof::public_inputs::{RotationPublicInput, NO_SESSION_KEY};
use crate::proof::SessionRotationProof;

use super::config::{ConfigError, RotationConfig};
use super::context::DeviceContext;
use super::ledger::{LedgerError, SessionLedger};
use super::retry::{retry_transient, Transient};
use super::transport::{ProofTransport, TransportError};

/// Outcome reported to the user interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationStatus {
    /// Proof generated and accepted.
    Success,
    /// Ledger or submission service could not be reached.
    ServerUnreachable,
    /// Identifiers missing or invalid, or the proof could not be produced.
    InvalidDeviceState,
}

impl std::fmt::Display for RotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ServerUnreachable => write!(f, "server unreachable"),
            Self::InvalidDeviceState => write!(f, "invalid device state"),
        }
    }
}

/// Rotation errors.
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    /// No identifiers have been set on the device context.
    #[error("device identifiers have not been set")]
    DeviceNotReady,
    /// Identifiers failed validation.
    #[error("invalid device identifiers: {0}")]
    InvalidDevice(#[from] IdentifierError),
    /// Ledger lookup failed.
    #[error("session ledger error: {0}")]
    Ledger(#[from] LedgerError),
    /// Submission failed.
    #[error("proof submission error: {0}")]
    Transport(#[from] TransportError),
    /// Setup or proving failed.
    #[error(transparent)]
    Proof(#[from] ProofError),
    /// Ledger returned a value that is not a session key.
    #[error("ledger returned an invalid session key: {0:?}")]
    InvalidSessionKey(String),
    /// Rotation did not finish within its deadline.
    #[error("rotation timed out after {0:?}")]
    Timeout(Duration),
}

impl RotationError {
    /// Whether running the rotation again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_transient(),
            Self::Transport(e) => e.is_transient(),
            Self::Timeout(_) => true,
            Self::DeviceNotReady
            | Self::InvalidDevice(_)
            | Self::Proof(_)
            | Self::InvalidSessionKey(_) => false,
        }
    }

    /// Status shown to the user.
    pub fn status(&self) -> RotationStatus {
        match self {
            Self::DeviceNotReady | Self::InvalidDevice(_) | Self::Proof(_) => {
                RotationStatus::InvalidDeviceState
            }
            Self::Ledger(_) | Self::Transport(_) | Self::InvalidSessionKey(_) | Self::Timeout(_) => {
                RotationStatus::ServerUnreachable
            }
        }
    }
}

/// A proved but not yet submitted rotation.
#[derive(Clone, Debug)]
pub struct PreparedRotation {
    /// Attempt identifier for log correlation.
    pub attempt_id: Uuid,
    /// Device fingerprint.
    pub fingerprint: Fingerprint,
    /// The proof.
    pub proof: SessionRotationProof,
    /// Serialized proof, as submitted.
    pub payload: String,
}

/// A submitted rotation.
#[derive(Clone, Debug)]
pub struct RotationReceipt {
    /// Attempt identifier for log correlation.
    pub attempt_id: Uuid,
    /// Device fingerprint.
    pub fingerprint: Fingerprint,
    /// The submitted proof.
    pub proof: SessionRotationProof,
    /// Serialized proof, as submitted.
    pub payload: String,
    /// When the submission service accepted the proof.
    pub submitted_at: DateTime<Utc>,
}

impl RotationReceipt {
    /// The session key now in effect.
    pub fn new_session_key(&self) -> u64 {
        self.proof.public_input.new_session_key
    }
}

/// Pick a session key in `[min, max]`, uniformly among keys other than
/// `current` when the domain has more than one key.
pub fn select_session_key<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64, current: u64) -> u64 {
    if min >= max {
        return min;
    }
    if current < min || current > max {
        return rng.gen_range(min..=max);
    }
    let pick = rng.gen_range(min..max);
    if pick >= current {
        pick + 1
    } else {
        pick
    }
}

/// Interpret a ledger record as a session key; absent means no session.
pub fn parse_session_key(value: Option<&str>) -> Result<u64, RotationError> {
    match value {
        None => Ok(NO_SESSION_KEY),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RotationError::InvalidSessionKey(raw.to_string())),
    }
}

/// Drives session rotations against a ledger and a submission transport.
#[derive(Debug)]
pub struct RotationOrchestrator<L, T> {
    config: RotationConfig,
    ledger: L,
    transport: T,
    prover: Prover,
}

impl<L: SessionLedger, T: ProofTransport> RotationOrchestrator<L, T> {
    /// Orchestrator with a prover pool sized from `config`.
    pub fn new(config: RotationConfig, ledger: L, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let prover = Prover::new(config.max_concurrent_proofs);
        Ok(Self { config, ledger, transport, prover })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Ledger in use.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Transport in use.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run proving setup ahead of the first rotation.
    pub async fn warm_up(&self) -> Result<(), RotationError> {
        self.prover.context().await?;
        Ok(())
    }

    /// Prove a rotation without submitting it.
    #[instrument(skip(self, device))]
    pub async fn prepare_rotation(
        &self,
        device: &DeviceContext,
        game_id: u64,
    ) -> Result<PreparedRotation, RotationError> {
        self.with_deadline(self.prepare(device, game_id)).await
    }

    /// Prove a rotation and submit it.
    #[instrument(skip(self, device))]
    pub async fn rotate(&self, device: &DeviceContext, game_id: u64) -> Result<RotationReceipt, RotationError> {
        self.with_deadline(async {
            let prepared = self.prepare(device, game_id).await?;

            retry_transient(&self.config.retry, "proof submission", || {
                self.transport.submit(&prepared.payload)
            })
            .await?;

            info!(
                attempt_id = %prepared.attempt_id,
                new_session_key = prepared.proof.public_input.new_session_key,
                digest = %prepared.proof.digest(),
                "Session rotation submitted"
            );
            Ok(RotationReceipt {
                attempt_id: prepared.attempt_id,
                fingerprint: prepared.fingerprint,
                proof: prepared.proof,
                payload: prepared.payload,
                submitted_at: Utc::now(),
            })
        })
        .await
    }

    /// Current session key recorded for this device and game, without
    /// proving anything. [`NO_SESSION_KEY`] when the ledger has no record.
    #[instrument(skip(self, device))]
    pub async fn current_session_key(&self, device: &DeviceContext, game_id: u64) -> Result<u64, RotationError> {
        self.with_deadline(async {
            let raw = device.identifiers().await.ok_or(RotationError::DeviceNotReady)?;
            let fingerprint = fingerprint(&canonicalize(&raw)?);
            self.lookup(game_id, &fingerprint).await
        })
        .await
    }

    /// Rotate and reduce the outcome to a user-facing status.
    pub async fn rotate_with_status(&self, device: &DeviceContext, game_id: u64) -> RotationStatus {
        match self.rotate(device, game_id).await {
            Ok(_) => RotationStatus::Success,
            Err(e) => {
                let status = e.status();
                warn!(game_id, %status, retryable = e.is_retryable(), error = %e, "Session rotation failed");
                status
            }
        }
    }

    async fn prepare(&self, device: &DeviceContext, game_id: u64) -> Result<PreparedRotation, RotationError> {
        let attempt_id = Uuid::new_v4();
        let raw = device.identifiers().await.ok_or(RotationError::DeviceNotReady)?;
        let identifiers = canonicalize(&raw)?;
        let fingerprint = fingerprint(&identifiers);
        debug!(%attempt_id, %fingerprint, "Device fingerprint computed");

        // No ledger traffic until the proving context exists.
        self.prover.context().await?;

        let current_session_key = self.lookup(game_id, &fingerprint).await?;

        let new_session_key = select_session_key(
            &mut rand::thread_rng(),
            self.config.session_key_min,
            self.config.session_key_max,
            current_session_key,
        );
        let input = RotationPublicInput { game_id, current_session_key, new_session_key };
        info!(
            %attempt_id,
            current_session_key,
            new_session_key,
            %fingerprint,
            "Proving session rotation"
        );

        let proof = self.prover.prove(input, identifiers).await?;
        let payload = String::from_utf8(serialize(&proof)?)
            .map_err(|e| ProofError::ProofGenerationFailed(e.to_string()))?;

        Ok(PreparedRotation { attempt_id, fingerprint, proof, payload })
    }

    async fn lookup(&self, game_id: u64, fingerprint: &Fingerprint) -> Result<u64, RotationError> {
        let record = retry_transient(&self.config.retry, "ledger lookup", || {
            self.ledger.current_session(game_id, fingerprint)
        })
        .await?;
        parse_session_key(record.as_deref())
    }

    async fn with_deadline<F, R>(&self, fut: F) -> Result<R, RotationError>
    where
        F: Future<Output = Result<R, RotationError>>,
    {
        let limit = self.config.rotation_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RotationError::Timeout(limit))?
    }
}

// =============================================================================
// TESTS
// =============================================================================
