//! Fingerprint Composer
//!
//! Combines canonical identifiers into one Pallas field element:
//!
//! ```text
//! Poseidon([cpuId, H(systemSerial), systemUUID, H(baseboardSerial),
//!           macPrimary, macSecondary, H(diskSerial)])
//! ```
//!
//! where `H` is the packed string hash from [`crate::core::hash`]. The order
//! is a compatibility contract with every ledger entry ever written.

use std::fmt;
use std::str::FromStr;

use pasta_curves::Fp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::field::{fp_from_decimal, fp_from_u128, fp_to_decimal, FieldParseError};
use crate::core::hash::{pack_words, poseidon_hash, SERIAL_CAPACITY_BYTES, SERIAL_HASH_INPUTS};

use super::canonical::{CanonicalIdentifiers, SerialNumber, SERIAL_MAX_BYTES};

/// Number of values absorbed by the fingerprint hash.
pub const FINGERPRINT_ARITY: usize = 7;

const _: () = assert!(SERIAL_MAX_BYTES <= SERIAL_CAPACITY_BYTES);

/// Device fingerprint commitment.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(Fp);

impl Fingerprint {
    /// Wrap a field element.
    pub fn from_field(value: Fp) -> Self {
        Self(value)
    }

    /// Underlying field element.
    pub fn to_field(self) -> Fp {
        self.0
    }

    /// Canonical decimal rendering.
    pub fn to_decimal(&self) -> String {
        fp_to_decimal(&self.0)
    }

    /// Parse a canonical decimal rendering.
    pub fn from_decimal(s: &str) -> Result<Self, FieldParseError> {
        fp_from_decimal(s).map(Self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_decimal())
    }
}

impl FromStr for Fingerprint {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_decimal(&s).map_err(serde::de::Error::custom)
    }
}

/// Packed words of a serial, as witnessed by the circuit.
pub fn serial_words(serial: &SerialNumber) -> [Fp; SERIAL_HASH_INPUTS] {
    // bounded by SERIAL_MAX_BYTES, checked against capacity above
    pack_words(serial.as_bytes())
}

/// Hash of a single serial.
pub fn serial_hash(serial: &SerialNumber) -> Fp {
    poseidon_hash(serial_words(serial))
}

/// The ordered tuple absorbed by the fingerprint hash.
pub fn fingerprint_inputs(c: &CanonicalIdentifiers) -> [Fp; FINGERPRINT_ARITY] {
    [
        Fp::from(c.cpu_id.value()),
        serial_hash(&c.system_serial),
        fp_from_u128(c.system_uuid.value()),
        serial_hash(&c.baseboard_serial),
        Fp::from(c.mac_address_primary.value()),
        Fp::from(c.mac_address_secondary.value()),
        serial_hash(&c.disk_serial),
    ]
}

/// Compose the device fingerprint.
pub fn fingerprint(c: &CanonicalIdentifiers) -> Fingerprint {
    Fingerprint(poseidon_hash(fingerprint_inputs(c)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::canonical::canonicalize;
    use crate::identity::raw::RawIdentifiers;

    fn sample_raw() -> RawIdentifiers {
        RawIdentifiers {
            cpu_id: "BFEBFBFF000906EA".to_string(),
            system_serial: "SN123".to_string(),
            system_uuid: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            baseboard_serial: "BB456".to_string(),
            mac_address: vec!["AA:BB:CC:DD:EE:FF".to_string(), "11:22:33:44:55:66".to_string()],
            disk_serial: "DK789".to_string(),
        }
    }

    fn fp_of(raw: &RawIdentifiers) -> Fingerprint {
        fingerprint(&canonicalize(raw).unwrap())
    }

    #[test]
    fn test_fingerprint_determinism() {
        assert_eq!(fp_of(&sample_raw()), fp_of(&sample_raw()));
    }

    /// Published fingerprints. Ledger entries are keyed by these values, so
    /// a change here breaks every existing session.
    #[test]
    fn test_fingerprint_known_values() {
        let device = RawIdentifiers {
            cpu_id: "AABBCCDD11223344".to_string(),
            system_serial: "SN123".to_string(),
            system_uuid: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            baseboard_serial: "BB456".to_string(),
            mac_address: vec!["AA:BB:CC:DD:EE:01".to_string(), "AA:BB:CC:DD:EE:02".to_string()],
            disk_serial: "DK789".to_string(),
        };
        assert_eq!(
            fp_of(&device).to_decimal(),
            "26922200392623820773669273113614425887770215608133192819578327846556595054053"
        );
        assert_eq!(
            fp_of(&sample_raw()).to_decimal(),
            "1363939609643832906169556496442314828790950306931283294890919225073901420226"
        );
    }

    #[test]
    fn test_serial_hash_matches_string_hash() {
        let serial = SerialNumber::parse(" sn123 ").unwrap();
        assert_eq!(Some(serial_hash(&serial)), crate::core::hash::hash_string(b"SN123"));
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let mut variant = sample_raw();
        variant.cpu_id = "bfebfbff000906ea".to_string();
        variant.mac_address[0] = "aabbccddeeff".to_string();
        variant.disk_serial = " dk789 ".to_string();
        assert_eq!(fp_of(&sample_raw()), fp_of(&variant));
    }

    #[test]
    fn test_each_field_changes_fingerprint() {
        let base = fp_of(&sample_raw());
        let mutations: Vec<Box<dyn Fn(&mut RawIdentifiers)>> = vec![
            Box::new(|r: &mut RawIdentifiers| r.cpu_id = "BFEBFBFF000906EB".to_string()),
            Box::new(|r: &mut RawIdentifiers| r.system_serial = "SN124".to_string()),
            Box::new(|r: &mut RawIdentifiers| r.system_uuid = "123e4567-e89b-12d3-a456-426614174001".to_string()),
            Box::new(|r: &mut RawIdentifiers| r.baseboard_serial = "BB457".to_string()),
            Box::new(|r: &mut RawIdentifiers| r.mac_address[0] = "AA:BB:CC:DD:EE:FE".to_string()),
            Box::new(|r: &mut RawIdentifiers| r.mac_address[1] = "11:22:33:44:55:67".to_string()),
            Box::new(|r: &mut RawIdentifiers| r.disk_serial = "DK788".to_string()),
        ];
        for (i, mutate) in mutations.iter().enumerate() {
            let mut raw = sample_raw();
            mutate(&mut raw);
            assert_ne!(fp_of(&raw), base, "field {} did not affect the fingerprint", i);
        }
    }

    #[test]
    fn test_swapped_macs_differ() {
        let mut raw = sample_raw();
        raw.mac_address.swap(0, 1);
        assert_ne!(fp_of(&raw), fp_of(&sample_raw()));
    }

    #[test]
    fn test_serial_positions_not_interchangeable() {
        let mut raw = sample_raw();
        std::mem::swap(&mut raw.system_serial, &mut raw.baseboard_serial);
        assert_ne!(fp_of(&raw), fp_of(&sample_raw()));
    }

    #[test]
    fn test_decimal_roundtrip_and_serde() {
        let fp = fp_of(&sample_raw());
        let decimal = fp.to_decimal();
        assert!(decimal.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(decimal.parse::<Fingerprint>(), Ok(fp));

        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", decimal));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Fingerprint>("\"0x12\"").is_err());
        assert!(serde_json::from_str::<Fingerprint>("12").is_err());
    }
}
