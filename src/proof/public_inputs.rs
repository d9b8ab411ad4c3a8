//! Proof Public Inputs
//!
//! The public side of a session rotation and its encoding as the circuit's
//! instance column.
//!
//! ```text
//! row  value
//! 0    input.gameId
//! 1    input.currentSessionKey
//! 2    input.newSessionKey
//! 3    output.gameId
//! 4    output.newSessionKey
//! 5    output.fingerprint
//! ```

use pasta_curves::Fp;
use serde::{Deserialize, Serialize};

use crate::identity::Fingerprint;

/// Number of rows in the instance column.
pub const INSTANCE_ROWS: usize = 6;

/// Instance row of `input.gameId`.
pub const GAME_ID_ROW: usize = 0;
/// Instance row of `input.currentSessionKey`.
pub const CURRENT_KEY_ROW: usize = 1;
/// Instance row of `input.newSessionKey`.
pub const NEW_KEY_ROW: usize = 2;
/// Instance row of `output.gameId`.
pub const OUT_GAME_ID_ROW: usize = 3;
/// Instance row of `output.newSessionKey`.
pub const OUT_NEW_KEY_ROW: usize = 4;
/// Instance row of `output.fingerprint`.
pub const OUT_FINGERPRINT_ROW: usize = 5;

/// Session key meaning "no prior session".
pub const NO_SESSION_KEY: u64 = 0;

/// Public input of a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationPublicInput {
    /// Game the session belongs to.
    pub game_id: u64,
    /// Key being replaced ([`NO_SESSION_KEY`] if none).
    pub current_session_key: u64,
    /// Key being requested.
    pub new_session_key: u64,
}

/// A rotation request is exactly its public input.
pub type SessionRotationRequest = RotationPublicInput;

/// Public output of a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationPublicOutput {
    /// Copied from the input.
    pub game_id: u64,
    /// Copied from the input.
    pub new_session_key: u64,
    /// Fingerprint of the proving device.
    pub fingerprint: Fingerprint,
}

impl RotationPublicOutput {
    /// Whether the pass-through fields agree with `input`.
    pub fn matches_input(&self, input: &RotationPublicInput) -> bool {
        self.game_id == input.game_id && self.new_session_key == input.new_session_key
    }
}

/// Encode a public input/output pair as the instance column.
pub fn instance_column(
    input: &RotationPublicInput,
    output: &RotationPublicOutput,
) -> [Fp; INSTANCE_ROWS] {
    let mut column = [Fp::from(0u64); INSTANCE_ROWS];
    column[GAME_ID_ROW] = Fp::from(input.game_id);
    column[CURRENT_KEY_ROW] = Fp::from(input.current_session_key);
    column[NEW_KEY_ROW] = Fp::from(input.new_session_key);
    column[OUT_GAME_ID_ROW] = Fp::from(output.game_id);
    column[OUT_NEW_KEY_ROW] = Fp::from(output.new_session_key);
    column[OUT_FINGERPRINT_ROW] = output.fingerprint.to_field();
    column
}
