//! Rotation Proof System
//!
//! Proves that a device knows hardware identifiers hashing to a published
//! fingerprint, bound to a game and a requested session key.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  public_inputs.rs - Public input/output, instance layout    │
//! │  relation.rs      - Private witness, native evaluation      │
//! │  circuit.rs       - halo2 circuit (Poseidon + pass-through) │
//! │  pipeline.rs      - Setup, prove, verify, (de)serialize     │
//! │  prover.rs        - Async bounded prover pool               │
//! │  payload.rs       - JSON wire format                        │
//! │  verify.rs        - Third-party verifier interface          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod circuit;
pub mod payload;
pub mod pipeline;
pub mod prover;
pub mod public_inputs;
pub mod relation;
pub mod verify;

// Re-export key types
pub use circuit::{RotationCircuit, CIRCUIT_K};
pub use payload::SessionRotationProof;
pub use pipeline::{
    deserialize, prove, serialize, setup, verify, verify_payload, ProofError, ProvingContext,
};
pub use prover::Prover;
pub use public_inputs::{
    RotationPublicInput, RotationPublicOutput, SessionRotationRequest, NO_SESSION_KEY,
};
pub use relation::{evaluate, RotationWitness};
pub use verify::{ProofVerificationError, ProofVerifier};
