//! Field Canonicalizer
//!
//! Validates raw identifier strings and normalizes them into fixed numeric or
//! canonical-string forms. Identical hardware canonicalizes identically no
//! matter which separator style or letter case the probe produced.
//!
//! Pure and synchronous; nothing here touches the proving system.

use std::fmt;

use thiserror::Error;

use super::raw::RawIdentifiers;

/// Longest serial accepted, in bytes after trimming.
pub const SERIAL_MAX_BYTES: usize = 128;

/// Number of MAC addresses a device reports.
pub const MAC_ADDRESS_COUNT: usize = 2;

/// Identifies which identifier failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentifierField {
    /// `cpuId`
    CpuId,
    /// `systemSerial`
    SystemSerial,
    /// `systemUUID`
    SystemUuid,
    /// `baseboardSerial`
    BaseboardSerial,
    /// `macAddress` (wrong number of entries)
    MacAddress,
    /// `macAddressPrimary`
    MacAddressPrimary,
    /// `macAddressSecondary`
    MacAddressSecondary,
    /// `diskSerial`
    DiskSerial,
}

impl IdentifierField {
    /// Wire name of the field.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CpuId => "cpuId",
            Self::SystemSerial => "systemSerial",
            Self::SystemUuid => "systemUUID",
            Self::BaseboardSerial => "baseboardSerial",
            Self::MacAddress => "macAddress",
            Self::MacAddressPrimary => "macAddressPrimary",
            Self::MacAddressSecondary => "macAddressSecondary",
            Self::DiskSerial => "diskSerial",
        }
    }
}

impl fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonicalization errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The named field is malformed.
    #[error("invalid format: {0}")]
    InvalidFormat(IdentifierField),
}

impl IdentifierError {
    /// The offending field.
    pub fn field(&self) -> IdentifierField {
        match self {
            Self::InvalidFormat(field) => *field,
        }
    }
}

/// CPU identifier: 64 bits from 16 hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuId(u64);

impl CpuId {
    /// Parse 16 hex digits, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        parse_hex_exact(raw.trim(), 16).map(|v| Self(v as u64))
    }

    /// Numeric value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// System UUID as a 128-bit integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SystemUuid(u128);

impl SystemUuid {
    /// Hyphen positions in the `8-4-4-4-12` layout.
    const HYPHENS: [usize; 4] = [8, 13, 18, 23];

    /// Parse the hyphenated textual form, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != 36 {
            return None;
        }
        let mut digits = String::with_capacity(32);
        for (i, c) in raw.char_indices() {
            if Self::HYPHENS.contains(&i) {
                if c != '-' {
                    return None;
                }
            } else {
                digits.push(c);
            }
        }
        parse_hex_exact(&digits, 32).map(Self)
    }

    /// Numeric value.
    pub fn value(self) -> u128 {
        self.0
    }
}

impl fmt::Display for SystemUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = format!("{:032X}", self.0);
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

/// Non-zero 48-bit MAC address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddress(u64);

impl MacAddress {
    /// Parse `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF` or `AABBCCDDEEFF`.
    ///
    /// Separators must be uniform. The all-zero address is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let value = match raw.len() {
            12 => parse_hex_exact(raw, 12)?,
            17 => {
                let bytes = raw.as_bytes();
                let sep = bytes[2];
                if sep != b':' && sep != b'-' {
                    return None;
                }
                let mut digits = String::with_capacity(12);
                for (i, octet) in raw.split(sep as char).enumerate() {
                    if i >= 6 || octet.len() != 2 {
                        return None;
                    }
                    digits.push_str(octet);
                }
                parse_hex_exact(&digits, 12)?
            }
            _ => return None,
        };
        if value == 0 {
            return None;
        }
        Some(Self(value as u64))
    }

    /// Numeric value (low 48 bits).
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0.to_be_bytes();
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[2], b[3], b[4], b[5], b[6], b[7]
        )
    }
}

/// Trimmed, uppercased, printable-ASCII serial of at most
/// [`SERIAL_MAX_BYTES`] bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Normalize and validate a serial.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > SERIAL_MAX_BYTES {
            return None;
        }
        if !trimmed.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    /// Canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical bytes (ASCII).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated, normalized identifiers. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalIdentifiers {
    /// Processor identifier.
    pub cpu_id: CpuId,
    /// System serial.
    pub system_serial: SerialNumber,
    /// System UUID.
    pub system_uuid: SystemUuid,
    /// Baseboard serial.
    pub baseboard_serial: SerialNumber,
    /// Primary (wired) MAC.
    pub mac_address_primary: MacAddress,
    /// Secondary (wireless) MAC.
    pub mac_address_secondary: MacAddress,
    /// Disk serial.
    pub disk_serial: SerialNumber,
}

impl CanonicalIdentifiers {
    /// Render back to raw form using canonical text for every field.
    pub fn to_raw(&self) -> RawIdentifiers {
        RawIdentifiers {
            cpu_id: self.cpu_id.to_string(),
            system_serial: self.system_serial.to_string(),
            system_uuid: self.system_uuid.to_string(),
            baseboard_serial: self.baseboard_serial.to_string(),
            mac_address: vec![
                self.mac_address_primary.to_string(),
                self.mac_address_secondary.to_string(),
            ],
            disk_serial: self.disk_serial.to_string(),
        }
    }
}

impl fmt::Debug for CanonicalIdentifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CanonicalIdentifiers([REDACTED])")
    }
}

/// Canonicalize every field, failing on the first malformed one.
///
/// Fields are checked in fingerprint order so the reported field is stable.
pub fn canonicalize(raw: &RawIdentifiers) -> Result<CanonicalIdentifiers, IdentifierError> {
    use IdentifierField as F;

    let cpu_id = CpuId::parse(&raw.cpu_id).ok_or(IdentifierError::InvalidFormat(F::CpuId))?;
    let system_serial = SerialNumber::parse(&raw.system_serial)
        .ok_or(IdentifierError::InvalidFormat(F::SystemSerial))?;
    let system_uuid = SystemUuid::parse(&raw.system_uuid)
        .ok_or(IdentifierError::InvalidFormat(F::SystemUuid))?;
    let baseboard_serial = SerialNumber::parse(&raw.baseboard_serial)
        .ok_or(IdentifierError::InvalidFormat(F::BaseboardSerial))?;

    let [primary, secondary] = raw.mac_address.as_slice() else {
        return Err(IdentifierError::InvalidFormat(F::MacAddress));
    };
    let mac_address_primary =
        MacAddress::parse(primary).ok_or(IdentifierError::InvalidFormat(F::MacAddressPrimary))?;
    let mac_address_secondary = MacAddress::parse(secondary)
        .ok_or(IdentifierError::InvalidFormat(F::MacAddressSecondary))?;

    let disk_serial = SerialNumber::parse(&raw.disk_serial)
        .ok_or(IdentifierError::InvalidFormat(F::DiskSerial))?;

    Ok(CanonicalIdentifiers {
        cpu_id,
        system_serial,
        system_uuid,
        baseboard_serial,
        mac_address_primary,
        mac_address_secondary,
        disk_serial,
    })
}

/// Parse exactly `digits` hex characters (at most 32).
fn parse_hex_exact(s: &str, digits: usize) -> Option<u128> {
    if s.len() != digits || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u128::from_str_radix(s, 16).ok()
}

// =============================================================================
// TESTS
// =============================================================================
