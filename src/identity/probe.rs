//! Identifier Probe
//!
//! Boundary to the platform code that reads hardware identifiers. OS-specific
//! collection lives with the host; this crate only consumes its output.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::raw::RawIdentifiers;

/// Probe errors.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Reading the probe output failed.
    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Probe output was not a valid identifier document.
    #[error("probe output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supplies raw identifiers for the current device.
pub trait IdentifierProbe {
    /// Collect identifiers. May return empty or malformed fields.
    fn probe(&self) -> Result<RawIdentifiers, ProbeError>;
}

/// Reads a [`RawIdentifiers`] JSON document from disk.
#[derive(Clone, Debug)]
pub struct JsonFileProbe {
    path: PathBuf,
}

impl JsonFileProbe {
    /// Probe backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentifierProbe for JsonFileProbe {
    fn probe(&self) -> Result<RawIdentifiers, ProbeError> {
        let bytes = std::fs::read(&self.path)?;
        let raw = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), "Loaded raw identifiers");
        Ok(raw)
    }
}

/// Fixed identifiers, for hosts that collect them another way.
#[derive(Clone, Debug, Default)]
pub struct StaticProbe(pub RawIdentifiers);

impl IdentifierProbe for StaticProbe {
    fn probe(&self) -> Result<RawIdentifiers, ProbeError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("device-session-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_json_file_probe() {
        let path = temp_path("probe-ok.json");
        std::fs::write(&path, r#"{"cpuId":"BFEBFBFF000906EA","macAddress":["a","b"]}"#).unwrap();

        let raw = JsonFileProbe::new(&path).probe().unwrap();
        assert_eq!(raw.cpu_id, "BFEBFBFF000906EA");
        assert_eq!(raw.mac_address, vec!["a", "b"]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_json_file_probe_errors() {
        let missing = JsonFileProbe::new(temp_path("does-not-exist.json"));
        assert!(matches!(missing.probe(), Err(ProbeError::Io(_))));

        let path = temp_path("probe-bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileProbe::new(&path).probe(), Err(ProbeError::Json(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_static_probe() {
        let raw = RawIdentifiers { disk_serial: "D1".to_string(), ..Default::default() };
        assert_eq!(StaticProbe(raw.clone()).probe().unwrap(), raw);
    }
}
