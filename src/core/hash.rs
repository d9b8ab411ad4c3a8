//! Poseidon Hashing
//!
//! Native Poseidon over the Pallas base field. The rotation circuit uses the
//! same permutation through the `halo2_gadgets` chip, so every value computed
//! here can be recomputed in-circuit.
//!
//! Parameters are fixed: `P128Pow5T3` (width 3, rate 2) with the
//! `ConstantLength` domain. Changing any of them changes every fingerprint.

use ff::Field;
use halo2_gadgets::poseidon::primitives::{self as poseidon, ConstantLength, P128Pow5T3};
use pasta_curves::Fp;

/// Poseidon state width.
pub const POSEIDON_WIDTH: usize = 3;

/// Poseidon absorption rate.
pub const POSEIDON_RATE: usize = 2;

/// Bytes packed into one field word (248 bits, always below the modulus).
pub const SERIAL_WORD_BYTES: usize = 31;

/// Field words per packed string.
pub const SERIAL_WORDS: usize = 5;

/// Largest string the packing can hold.
pub const SERIAL_CAPACITY_BYTES: usize = SERIAL_WORD_BYTES * SERIAL_WORDS;

/// Inputs to the string hash: byte length followed by the packed words.
pub const SERIAL_HASH_INPUTS: usize = SERIAL_WORDS + 1;

/// Hash a fixed-length message.
pub fn poseidon_hash<const L: usize>(message: [Fp; L]) -> Fp {
    poseidon::Hash::<Fp, P128Pow5T3, ConstantLength<L>, POSEIDON_WIDTH, POSEIDON_RATE>::init()
        .hash(message)
}

/// Pack a byte string into `[len, w0, .., w4]`.
///
/// Each word holds 31 bytes, little-endian, zero padded. The length prefix
/// keeps strings that differ only in trailing zero bytes apart. Returns
/// `None` for strings longer than [`SERIAL_CAPACITY_BYTES`].
pub fn pack_string(bytes: &[u8]) -> Option<[Fp; SERIAL_HASH_INPUTS]> {
    (bytes.len() <= SERIAL_CAPACITY_BYTES).then(|| pack_words(bytes))
}

/// Collision-resistant string hash: Poseidon over the packed words.
pub fn hash_string(bytes: &[u8]) -> Option<Fp> {
    pack_string(bytes).map(poseidon_hash)
}

/// Packing without the capacity check. Only for inputs whose length is
/// already bounded by construction.
pub(crate) fn pack_words(bytes: &[u8]) -> [Fp; SERIAL_HASH_INPUTS] {
    let mut packed = [Fp::ZERO; SERIAL_HASH_INPUTS];
    packed[0] = Fp::from(bytes.len() as u64);

    for (word, chunk) in packed[1..].iter_mut().zip(bytes.chunks(SERIAL_WORD_BYTES)) {
        *word = chunk
            .iter()
            .rev()
            .fold(Fp::ZERO, |acc, &b| acc * Fp::from(256u64) + Fp::from(u64::from(b)));
    }

    packed
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::fp_to_decimal;

    #[test]
    fn test_hash_determinism() {
        let h1 = poseidon_hash([Fp::from(1u64), Fp::from(2u64)]);
        let h2 = poseidon_hash([Fp::from(1u64), Fp::from(2u64)]);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_order_matters() {
        let h1 = poseidon_hash([Fp::from(1u64), Fp::from(2u64)]);
        let h2 = poseidon_hash([Fp::from(2u64), Fp::from(1u64)]);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_length_is_part_of_domain() {
        let h2 = poseidon_hash([Fp::from(1u64), Fp::from(2u64)]);
        let h3 = poseidon_hash([Fp::from(1u64), Fp::from(2u64), Fp::ZERO]);
        assert_ne!(h2, h3);
    }

    #[test]
    fn test_hash_known_value() {
        // P128Pow5T3, ConstantLength<2>
        let h = poseidon_hash([Fp::from(1u64), Fp::from(2u64)]);
        assert_eq!(
            fp_to_decimal(&h),
            "24123908145095057026791623326467558304806014471451005010637196320467268264780"
        );
    }

    #[test]
    fn test_pack_string_layout() {
        let packed = pack_string(b"AB").unwrap();
        assert_eq!(packed[0], Fp::from(2u64));
        // little-endian: 'A' + 'B' * 256
        assert_eq!(packed[1], Fp::from(0x41u64 + 0x42 * 256));
        assert!(packed[2..].iter().all(|w| *w == Fp::ZERO));
    }

    #[test]
    fn test_pack_string_known_value() {
        let packed = pack_string(b"SN123").unwrap();
        assert_eq!(packed[0], Fp::from(5u64));
        assert_eq!(packed[1], Fp::from(219_885_424_211u64));
        assert!(packed[2..].iter().all(|w| *w == Fp::ZERO));
    }

    #[test]
    fn test_pack_string_spans_words() {
        let bytes = vec![b'Z'; SERIAL_WORD_BYTES + 1];
        let packed = pack_string(&bytes).unwrap();
        assert_eq!(packed[0], Fp::from((SERIAL_WORD_BYTES + 1) as u64));
        assert_eq!(packed[2], Fp::from(u64::from(b'Z')));
        assert_eq!(packed[3], Fp::ZERO);
    }

    #[test]
    fn test_string_hash_known_values() {
        assert_eq!(
            fp_to_decimal(&hash_string(b"SN123").unwrap()),
            "17925547365272305140131944910504657335833196480650829145177123561139096555885"
        );
        assert_eq!(
            fp_to_decimal(&hash_string(b"").unwrap()),
            "24225962717873218403405818536874142233682560075541148922022557893854546822553"
        );
    }

    #[test]
    fn test_string_hash_distinguishes() {
        assert_ne!(hash_string(b"AB"), hash_string(b"BA"));
        assert_ne!(hash_string(b"SN1"), hash_string(b"SN12"));
        assert_ne!(hash_string(b""), hash_string(b"0"));
        assert_eq!(hash_string(b"DK789"), hash_string(b"DK789"));
    }

    #[test]
    fn test_full_capacity_packs() {
        let bytes = vec![0x7Eu8; SERIAL_CAPACITY_BYTES];
        let packed = pack_string(&bytes).unwrap();
        assert!(packed[1..].iter().all(|w| *w != Fp::ZERO));
    }

    #[test]
    fn test_oversize_string_rejected() {
        let long = vec![b'A'; SERIAL_CAPACITY_BYTES + 1];
        let mut longer = long.clone();
        longer.push(b'B');
        assert_eq!(pack_string(&long), None);
        assert_eq!(hash_string(&long), None);
        assert_eq!(hash_string(&longer), None);
    }
}
