//! Field Encoding
//!
//! Conversions between integers, decimal strings and the Pallas base field.
//!
//! Decimal is the external form of every field element this crate publishes
//! (fingerprints in ledger keys, UI notifications and proof payloads), so the
//! encoding is canonical: no sign, no leading zeros, value below the modulus.

use ff::PrimeField;
use pasta_curves::Fp;
use thiserror::Error;

/// Size of a field element's canonical byte representation.
pub const FIELD_BYTES: usize = 32;

/// Errors from parsing a decimal field element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    /// Input was empty.
    #[error("empty decimal string")]
    Empty,
    /// Input contained something other than ASCII digits.
    #[error("invalid decimal digit")]
    InvalidDigit,
    /// Input had a leading zero (non-canonical).
    #[error("leading zero in decimal field element")]
    LeadingZero,
    /// Value is not below the field modulus.
    #[error("value exceeds the field modulus")]
    OutOfRange,
}

/// Lift a 128-bit integer into the field (exact, the modulus is ~2^254).
#[inline]
pub fn fp_from_u128(value: u128) -> Fp {
    Fp::from_u128(value)
}

/// Render a field element as a canonical decimal string.
pub fn fp_to_decimal(value: &Fp) -> String {
    // to_repr is little-endian; long division wants most significant first
    let repr = value.to_repr();
    let le: &[u8] = repr.as_ref();
    let mut be: Vec<u8> = le.iter().rev().copied().collect();
    let mut digits = Vec::new();

    while be.iter().any(|&b| b != 0) {
        let mut rem: u32 = 0;
        for byte in be.iter_mut() {
            let cur = (rem << 8) | u32::from(*byte);
            *byte = (cur / 10) as u8;
            rem = cur % 10;
        }
        digits.push(b'0' + rem as u8);
    }

    if digits.is_empty() {
        return "0".to_string();
    }
    digits.reverse();
    // digits are ASCII by construction
    String::from_utf8_lossy(&digits).into_owned()
}

/// Parse a canonical decimal string into a field element.
pub fn fp_from_decimal(s: &str) -> Result<Fp, FieldParseError> {
    if s.is_empty() {
        return Err(FieldParseError::Empty);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldParseError::InvalidDigit);
    }
    if s.len() > 1 && s.starts_with('0') {
        return Err(FieldParseError::LeadingZero);
    }

    let mut le = [0u8; FIELD_BYTES];
    for digit in s.bytes().map(|b| u32::from(b - b'0')) {
        let mut carry = digit;
        for byte in le.iter_mut() {
            let cur = u32::from(*byte) * 10 + carry;
            *byte = (cur & 0xff) as u8;
            carry = cur >> 8;
        }
        if carry != 0 {
            return Err(FieldParseError::OutOfRange);
        }
    }

    let mut repr = <Fp as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(&le);
    Option::from(Fp::from_repr(repr)).ok_or(FieldParseError::OutOfRange)
}

// =============================================================================
// TESTS
// =============================================================================
