//! Device identity.
//!
//! ```text
//! probe ──► RawIdentifiers ──► canonicalize ──► CanonicalIdentifiers ──► fingerprint
//! ```
//!
//! Raw and canonical identifiers never leave the device and are redacted
//! from `Debug` output. Only the [`Fingerprint`] is published.

pub mod canonical;
pub mod fingerprint;
pub mod probe;
pub mod raw;

pub use canonical::{
    canonicalize, CanonicalIdentifiers, CpuId, IdentifierError, IdentifierField, MacAddress,
    SerialNumber, SystemUuid,
};
pub use fingerprint::{fingerprint, Fingerprint};
pub use probe::{IdentifierProbe, JsonFileProbe, ProbeError, StaticProbe};
pub use raw::RawIdentifiers;
