//! # Device Session
//!
//! Hardware-bound game session rotation with zero-knowledge fingerprint
//! proofs.
//!
//! A device proves that it knows hardware identifiers hashing to a published
//! fingerprint, and that it requests a specific new session key for a game,
//! without revealing the identifiers to the verifier or the ledger.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DEVICE SESSION                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Field primitives                         │
//! │  ├── field.rs     - Decimal / integer encoding of Fp         │
//! │  └── hash.rs      - Poseidon, string packing                 │
//! │                                                              │
//! │  identity/        - Device identity (pure)                   │
//! │  ├── raw.rs       - Raw probe output                         │
//! │  ├── canonical.rs - Validation and normalization             │
//! │  ├── fingerprint.rs- Fingerprint composer                    │
//! │  └── probe.rs     - Identifier probe boundary                │
//! │                                                              │
//! │  proof/           - Rotation proofs (CPU-bound)              │
//! │  ├── circuit.rs   - halo2 rotation circuit                   │
//! │  ├── pipeline.rs  - Setup, prove, verify                     │
//! │  └── prover.rs    - Async prover pool                        │
//! │                                                              │
//! │  rotation/        - Orchestration (I/O)                      │
//! │  ├── ledger.rs    - Session ledger lookup                    │
//! │  ├── transport.rs - Proof submission                         │
//! │  └── orchestrator.rs - End-to-end rotation                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! `core/` and `identity/` are pure: identical hardware yields an identical
//! fingerprint on every platform, regardless of how the probe formatted the
//! identifiers. Only key selection and proof blinding use randomness.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod identity;
pub mod proof;
pub mod rotation;

// Re-export commonly used types
pub use identity::{canonicalize, fingerprint, CanonicalIdentifiers, Fingerprint, RawIdentifiers};
pub use proof::{ProofError, RotationPublicInput, RotationPublicOutput, SessionRotationProof};
pub use rotation::{
    DeviceContext, RotationConfig, RotationError, RotationOrchestrator, RotationReceipt,
    RotationStatus,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
