//! Rotation Relation
//!
//! The statement proved by a rotation, evaluated natively. The circuit in
//! [`crate::proof::circuit`] enforces the same statement:
//!
//! - `output.fingerprint == Composer(witness)`
//! - `output.gameId == input.gameId`
//! - `output.newSessionKey == input.newSessionKey`
//! - both MAC witnesses are non-zero
//!
//! `currentSessionKey` is public but unconstrained.

use ff::Field;
use pasta_curves::Fp;

use crate::core::field::fp_from_u128;
use crate::core::hash::{poseidon_hash, SERIAL_HASH_INPUTS};
use crate::identity::fingerprint::serial_words;
use crate::identity::{CanonicalIdentifiers, Fingerprint};

use super::public_inputs::{RotationPublicInput, RotationPublicOutput};

/// Private input: canonical identifiers as field elements.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RotationWitness {
    /// CPU identifier.
    pub cpu_id: Fp,
    /// Packed system serial.
    pub system_serial: [Fp; SERIAL_HASH_INPUTS],
    /// System UUID.
    pub system_uuid: Fp,
    /// Packed baseboard serial.
    pub baseboard_serial: [Fp; SERIAL_HASH_INPUTS],
    /// Primary MAC.
    pub mac_primary: Fp,
    /// Secondary MAC.
    pub mac_secondary: Fp,
    /// Packed disk serial.
    pub disk_serial: [Fp; SERIAL_HASH_INPUTS],
}

impl RotationWitness {
    /// Witness for a device.
    pub fn from_identifiers(c: &CanonicalIdentifiers) -> Self {
        Self {
            cpu_id: Fp::from(c.cpu_id.value()),
            system_serial: serial_words(&c.system_serial),
            system_uuid: fp_from_u128(c.system_uuid.value()),
            baseboard_serial: serial_words(&c.baseboard_serial),
            mac_primary: Fp::from(c.mac_address_primary.value()),
            mac_secondary: Fp::from(c.mac_address_secondary.value()),
            disk_serial: serial_words(&c.disk_serial),
        }
    }

    /// Fingerprint committed to by this witness.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_field(poseidon_hash([
            self.cpu_id,
            poseidon_hash(self.system_serial),
            self.system_uuid,
            poseidon_hash(self.baseboard_serial),
            self.mac_primary,
            self.mac_secondary,
            poseidon_hash(self.disk_serial),
        ]))
    }

    /// Whether both MAC witnesses are non-zero.
    pub fn macs_nonzero(&self) -> bool {
        !bool::from(self.mac_primary.is_zero()) && !bool::from(self.mac_secondary.is_zero())
    }
}

impl std::fmt::Debug for RotationWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RotationWitness([REDACTED])")
    }
}

/// Expected public output for a public input and witness.
pub fn evaluate(input: &RotationPublicInput, witness: &RotationWitness) -> RotationPublicOutput {
    RotationPublicOutput {
        game_id: input.game_id,
        new_session_key: input.new_session_key,
        fingerprint: witness.fingerprint(),
    }
}

/// Whether `(input, output)` is a true statement for `witness`.
pub fn holds(
    input: &RotationPublicInput,
    witness: &RotationWitness,
    output: &RotationPublicOutput,
) -> bool {
    witness.macs_nonzero() && evaluate(input, witness) == *output
}
