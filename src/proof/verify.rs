//! Verification API
//!
//! Interface for third parties (the session service, auditors) that check
//! rotation proofs without access to the device.

use thiserror::Error;

use super::payload::SessionRotationProof;
use super::pipeline::{self, ProvingContext};

/// Checks rotation proofs.
pub trait ProofVerifier {
    /// Verify a rotation proof against the statement it carries.
    ///
    /// `Ok(false)` means a well-formed proof that does not verify.
    fn verify_rotation(&self, proof: &SessionRotationProof) -> Result<bool, ProofVerificationError>;
}

/// Errors during proof verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofVerificationError {
    /// Proof bytes are empty.
    #[error("invalid proof format")]
    InvalidProofFormat,
    /// Public output does not carry the input's game id and new key.
    #[error("public output does not match public input")]
    PublicOutputMismatch,
}

impl ProofVerifier for ProvingContext {
    fn verify_rotation(&self, proof: &SessionRotationProof) -> Result<bool, ProofVerificationError> {
        if proof.proof.is_empty() {
            return Err(ProofVerificationError::InvalidProofFormat);
        }
        if !proof.public_output.matches_input(&proof.public_input) {
            return Err(ProofVerificationError::PublicOutputMismatch);
        }
        Ok(pipeline::verify(self, &proof.public_input, &proof.public_output, &proof.proof))
    }
}

// =============================================================================
// TESTS
// =============================================================================
