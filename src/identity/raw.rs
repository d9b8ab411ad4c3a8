//! Raw Identifiers
//!
//! Hardware identifier strings exactly as the platform probe reported them.
//! Nothing here is validated; see [`crate::identity::canonical`].

use serde::{Deserialize, Serialize};

/// Best-effort hardware identifiers from the platform probe.
///
/// Any field may be empty or malformed. Missing JSON fields deserialize as
/// empty so a partial probe still produces a value the canonicalizer can
/// reject with a precise field name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawIdentifiers {
    /// Processor identifier (16 hex digits when well-formed).
    pub cpu_id: String,
    /// System (chassis) serial number.
    pub system_serial: String,
    /// SMBIOS system UUID.
    #[serde(rename = "systemUUID")]
    pub system_uuid: String,
    /// Baseboard serial number.
    pub baseboard_serial: String,
    /// Primary wired and wireless interface MACs, in that order.
    pub mac_address: Vec<String>,
    /// Boot disk serial number.
    pub disk_serial: String,
}

// Identifiers are device-linking secrets; keep them out of logs.
impl std::fmt::Debug for RawIdentifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawIdentifiers")
            .field("cpu_id", &"[REDACTED]")
            .field("system_serial", &"[REDACTED]")
            .field("system_uuid", &"[REDACTED]")
            .field("baseboard_serial", &"[REDACTED]")
            .field("mac_address", &format_args!("[{} REDACTED]", self.mac_address.len()))
            .field("disk_serial", &"[REDACTED]")
            .finish()
    }
}
