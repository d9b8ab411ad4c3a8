//! Core field primitives.
//!
//! Everything above this module speaks in Pallas base-field elements: the
//! fingerprint, the circuit instance and the payload's public output. These
//! helpers are shared by the native code path and the circuit so both agree
//! bit for bit.

pub mod field;
pub mod hash;

// Re-export core types
pub use field::{fp_from_decimal, fp_from_u128, fp_to_decimal, FieldParseError};
pub use hash::{hash_string, pack_string, poseidon_hash, SERIAL_HASH_INPUTS};
