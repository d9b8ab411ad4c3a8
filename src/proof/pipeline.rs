//! Proof Pipeline
//!
//! One-time setup, proving, verification and payload (de)serialization for
//! the rotation circuit.
//!
//! Setup generates IPA parameters and keys for [`CIRCUIT_K`]; it takes a few
//! seconds and is cached for the life of the process. Proving is CPU-bound
//! and synchronous; async callers go through [`crate::proof::prover::Prover`].

use std::sync::Arc;
use std::time::Instant;

use halo2_proofs::{
    plonk::{create_proof, keygen_pk, keygen_vk, verify_proof, ProvingKey, SingleVerifier, VerifyingKey},
    poly::commitment::Params,
    transcript::{Blake2bRead, Blake2bWrite, Challenge255},
};
use once_cell::sync::OnceCell;
use pasta_curves::{EqAffine, Fp};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::identity::CanonicalIdentifiers;

use super::circuit::{RotationCircuit, CIRCUIT_K};
use super::payload::SessionRotationProof;
use super::public_inputs::{instance_column, RotationPublicInput, RotationPublicOutput};
use super::relation::{evaluate, RotationWitness};

/// Proof pipeline errors.
#[derive(Debug, Error)]
pub enum ProofError {
    /// Parameter or key generation failed.
    #[error("proving setup failed: {0}")]
    Setup(String),
    /// Proving failed or produced a proof that does not verify.
    /// Indicates a defect, not bad input.
    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),
    /// Payload could not be encoded or decoded.
    #[error("invalid proof payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// A blocking proof task panicked or was cancelled.
    #[error("proof task aborted: {0}")]
    TaskAborted(String),
}

/// Parameters and keys for the rotation circuit.
pub struct ProvingContext {
    k: u32,
    params: Params<EqAffine>,
    pk: ProvingKey<EqAffine>,
}

impl ProvingContext {
    /// Generate parameters and keys for a circuit of `2^k` rows.
    pub fn generate(k: u32) -> Result<Self, ProofError> {
        let params = Params::<EqAffine>::new(k);
        let empty = RotationCircuit::default();
        let vk = keygen_vk(&params, &empty)
            .map_err(|e| ProofError::Setup(format!("verifying key: {:?}", e)))?;
        let pk = keygen_pk(&params, vk, &empty)
            .map_err(|e| ProofError::Setup(format!("proving key: {:?}", e)))?;
        Ok(Self { k, params, pk })
    }

    /// log2 of the circuit size the keys were generated for.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey<EqAffine> {
        self.pk.get_vk()
    }

    /// Create a raw proof that `witness` satisfies the circuit for `instance`.
    ///
    /// Does not check that `instance` is the honest one.
    pub(crate) fn create_raw_proof(
        &self,
        witness: RotationWitness,
        instance: &[Fp],
    ) -> Result<Vec<u8>, ProofError> {
        let circuit = RotationCircuit::new(witness);
        let mut transcript = Blake2bWrite::<_, EqAffine, Challenge255<_>>::init(vec![]);
        create_proof(&self.params, &self.pk, &[circuit], &[&[instance]], OsRng, &mut transcript)
            .map_err(|e| ProofError::ProofGenerationFailed(format!("{:?}", e)))?;
        Ok(transcript.finalize())
    }

    /// Check raw proof bytes against an instance column.
    pub(crate) fn verify_raw(&self, instance: &[Fp], proof: &[u8]) -> bool {
        let strategy = SingleVerifier::new(&self.params);
        let mut transcript = Blake2bRead::<_, EqAffine, Challenge255<_>>::init(proof);
        verify_proof(&self.params, self.pk.get_vk(), strategy, &[&[instance]], &mut transcript).is_ok()
    }
}

impl std::fmt::Debug for ProvingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvingContext").field("k", &self.k).finish()
    }
}

static PROVING_CONTEXT: OnceCell<Arc<ProvingContext>> = OnceCell::new();

/// Process-wide proving context, generated on first use.
///
/// Concurrent first callers block until the single generation finishes.
/// A failed setup is not cached; the next call retries.
pub fn setup() -> Result<Arc<ProvingContext>, ProofError> {
    PROVING_CONTEXT
        .get_or_try_init(|| {
            info!(k = CIRCUIT_K, "Generating proving context");
            let start = Instant::now();
            let ctx = ProvingContext::generate(CIRCUIT_K)?;
            info!(elapsed_ms = start.elapsed().as_millis() as u64, "Proving context ready");
            Ok(Arc::new(ctx))
        })
        .map(Arc::clone)
}

/// The proving context, if setup already ran.
pub fn cached() -> Option<Arc<ProvingContext>> {
    PROVING_CONTEXT.get().cloned()
}

/// Prove a rotation for a device.
///
/// The proof is checked against the verifying key before it is returned.
pub fn prove(
    ctx: &ProvingContext,
    input: &RotationPublicInput,
    identifiers: &CanonicalIdentifiers,
) -> Result<SessionRotationProof, ProofError> {
    let witness = RotationWitness::from_identifiers(identifiers);
    let output = evaluate(input, &witness);
    prove_claim(ctx, input, witness, output)
}

/// Prove an arbitrary claimed output. Fails unless the claim is true.
pub(crate) fn prove_claim(
    ctx: &ProvingContext,
    input: &RotationPublicInput,
    witness: RotationWitness,
    output: RotationPublicOutput,
) -> Result<SessionRotationProof, ProofError> {
    let start = Instant::now();
    let instance = instance_column(input, &output);

    let result = ctx.create_raw_proof(witness, &instance).and_then(|proof| {
        if ctx.verify_raw(&instance, &proof) {
            Ok(proof)
        } else {
            Err(ProofError::ProofGenerationFailed(
                "proof does not verify against its public output".to_string(),
            ))
        }
    });

    match result {
        Ok(proof) => {
            let proof = SessionRotationProof { public_input: *input, public_output: output, proof };
            debug!(
                game_id = input.game_id,
                digest = %proof.digest(),
                bytes = proof.proof.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Rotation proof created"
            );
            Ok(proof)
        }
        Err(e) => {
            error!(
                game_id = input.game_id,
                current_session_key = input.current_session_key,
                new_session_key = input.new_session_key,
                fingerprint = %output.fingerprint,
                error = %e,
                "Rotation proof generation failed"
            );
            Err(e)
        }
    }
}

/// Verify proof bytes against a public input and claimed output.
pub fn verify(
    ctx: &ProvingContext,
    input: &RotationPublicInput,
    output: &RotationPublicOutput,
    proof: &[u8],
) -> bool {
    if proof.is_empty() || !output.matches_input(input) {
        return false;
    }
    ctx.verify_raw(&instance_column(input, output), proof)
}

/// Verify a serialized payload.
pub fn verify_payload(ctx: &ProvingContext, payload: &[u8]) -> Result<bool, ProofError> {
    let proof = deserialize(payload)?;
    Ok(verify(ctx, &proof.public_input, &proof.public_output, &proof.proof))
}

/// Encode a proof as its JSON payload.
pub fn serialize(proof: &SessionRotationProof) -> Result<Vec<u8>, ProofError> {
    Ok(serde_json::to_vec(proof)?)
}

/// Decode a JSON payload.
pub fn deserialize(payload: &[u8]) -> Result<SessionRotationProof, ProofError> {
    Ok(serde_json::from_slice(payload)?)
}

// =============================================================================
// TESTS
// =============================================================================
