//! Prover Pool
//!
//! Async facade over the proof pipeline. Setup and proving are CPU-bound, so
//! they run on tokio's blocking pool; a semaphore bounds how many proofs run
//! at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::identity::CanonicalIdentifiers;

use super::payload::SessionRotationProof;
use super::pipeline::{self, ProofError, ProvingContext};
use super::public_inputs::RotationPublicInput;

/// Bounded pool of proof workers.
#[derive(Clone, Debug)]
pub struct Prover {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl Prover {
    /// Pool running at most `max_concurrent` proofs (minimum 1).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self { permits: Arc::new(Semaphore::new(max_concurrent)), max_concurrent }
    }

    /// Pool sized to the machine's available parallelism.
    pub fn with_available_parallelism() -> Self {
        Self::new(available_parallelism())
    }

    /// Maximum concurrent proofs.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Proving context, running setup on the blocking pool if needed.
    pub async fn context(&self) -> Result<Arc<ProvingContext>, ProofError> {
        if let Some(ctx) = pipeline::cached() {
            return Ok(ctx);
        }
        tokio::task::spawn_blocking(pipeline::setup)
            .await
            .map_err(|e| ProofError::TaskAborted(e.to_string()))?
    }

    /// Prove a rotation on the blocking pool.
    pub async fn prove(
        &self,
        input: RotationPublicInput,
        identifiers: CanonicalIdentifiers,
    ) -> Result<SessionRotationProof, ProofError> {
        let ctx = self.context().await?;
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ProofError::TaskAborted(e.to_string()))?;
        debug!(game_id = input.game_id, "Proof worker acquired");

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            pipeline::prove(&ctx, &input, &identifiers)
        })
        .await
        .map_err(|e| ProofError::TaskAborted(e.to_string()))?
    }

    /// Verify a payload on the blocking pool.
    pub async fn verify(&self, proof: SessionRotationProof) -> Result<bool, ProofError> {
        let ctx = self.context().await?;
        tokio::task::spawn_blocking(move || {
            pipeline::verify(&ctx, &proof.public_input, &proof.public_output, &proof.proof)
        })
        .await
        .map_err(|e| ProofError::TaskAborted(e.to_string()))
    }

    /// Decode and verify a serialized payload on the blocking pool.
    pub async fn verify_payload(&self, payload: &[u8]) -> Result<bool, ProofError> {
        self.verify(pipeline::deserialize(payload)?).await
    }
}

impl Default for Prover {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

/// Number of cores available to this process (at least 1).
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
