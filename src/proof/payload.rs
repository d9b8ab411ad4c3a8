//! Proof Payload
//!
//! Wire format of a finished rotation proof, as submitted to the session
//! service:
//!
//! ```json
//! {
//!   "publicInput":  { "gameId": 1, "currentSessionKey": 0, "newSessionKey": 4242 },
//!   "publicOutput": { "gameId": 1, "newSessionKey": 4242, "fingerprint": "1234..." },
//!   "proof": "<hex>"
//! }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::public_inputs::{RotationPublicInput, RotationPublicOutput};

/// A rotation proof with the statement it proves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRotationProof {
    /// Public input the proof was produced for.
    pub public_input: RotationPublicInput,
    /// Claimed public output.
    pub public_output: RotationPublicOutput,
    /// Opaque proof bytes.
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

impl SessionRotationProof {
    /// Short SHA-256 digest of the proof bytes, for logs.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(&self.proof);
        hex::encode(&hash[..8])
    }
}

impl std::fmt::Debug for SessionRotationProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRotationProof")
            .field("public_input", &self.public_input)
            .field("public_output", &self.public_output)
            .field("proof_len", &self.proof.len())
            .field("proof_digest", &self.digest())
            .finish()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
