//! Device context.
//!
//! Holds the identifiers of the device this process runs on and announces
//! its fingerprint to the host UI when they change.

use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::identity::{canonicalize, fingerprint, Fingerprint, IdentifierError, RawIdentifiers};

/// Capacity of the event channel.
const EVENT_CAPACITY: usize = 16;

/// Notifications for the host layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Identifiers were set; carries the fingerprint as a decimal string.
    DeviceSet {
        /// Decimal fingerprint.
        fingerprint: String,
    },
}

/// Current device identifiers plus an event channel.
#[derive(Debug)]
pub struct DeviceContext {
    identifiers: RwLock<Option<RawIdentifiers>>,
    event_tx: broadcast::Sender<DeviceEvent>,
}

impl DeviceContext {
    /// Context with no identifiers yet.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { identifiers: RwLock::new(None), event_tx }
    }

    /// Replace the identifiers and announce the new fingerprint.
    ///
    /// Malformed identifiers are still stored, so a later rotation reports
    /// the device as invalid rather than not ready; no event is sent for
    /// them.
    pub async fn set_identifiers(&self, raw: RawIdentifiers) -> Result<Fingerprint, IdentifierError> {
        let computed = canonicalize(&raw).map(|c| fingerprint(&c));
        *self.identifiers.write().await = Some(raw);

        match computed {
            Ok(fp) => {
                info!(fingerprint = %fp, "Device identifiers set");
                // no subscribers is fine
                let _ = self.event_tx.send(DeviceEvent::DeviceSet { fingerprint: fp.to_decimal() });
                Ok(fp)
            }
            Err(e) => {
                warn!(field = %e.field(), "Device identifiers are malformed");
                Err(e)
            }
        }
    }

    /// Snapshot of the current identifiers.
    pub async fn identifiers(&self) -> Option<RawIdentifiers> {
        self.identifiers.read().await.clone()
    }

    /// Forget the identifiers.
    pub async fn clear(&self) {
        *self.identifiers.write().await = None;
    }

    /// Subscribe to device events.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentifierField;

    fn raw() -> RawIdentifiers {
        RawIdentifiers {
            cpu_id: "BFEBFBFF000906EA".to_string(),
            system_serial: "SN123".to_string(),
            system_uuid: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            baseboard_serial: "BB456".to_string(),
            mac_address: vec!["AA:BB:CC:DD:EE:FF".to_string(), "11:22:33:44:55:66".to_string()],
            disk_serial: "DK789".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_identifiers_publishes_fingerprint() {
        let ctx = DeviceContext::new();
        let mut events = ctx.subscribe();
        assert!(ctx.identifiers().await.is_none());

        let fp = ctx.set_identifiers(raw()).await.unwrap();
        assert_eq!(ctx.identifiers().await, Some(raw()));
        assert_eq!(
            events.recv().await.unwrap(),
            DeviceEvent::DeviceSet { fingerprint: fp.to_decimal() }
        );
    }

    #[tokio::test]
    async fn test_malformed_identifiers_stored_without_event() {
        let ctx = DeviceContext::new();
        let mut events = ctx.subscribe();
        let mut bad = raw();
        bad.mac_address[0] = "00:00:00:00:00:00".to_string();

        let err = ctx.set_identifiers(bad.clone()).await.unwrap_err();
        assert_eq!(err.field(), IdentifierField::MacAddressPrimary);
        assert_eq!(ctx.identifiers().await, Some(bad));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_set_without_subscribers_and_clear() {
        let ctx = DeviceContext::default();
        assert!(ctx.set_identifiers(raw()).await.is_ok());
        ctx.clear().await;
        assert!(ctx.identifiers().await.is_none());
    }
}
