//! Session rotation (I/O side).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ROTATION                                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config.rs       - Endpoints, key domain, timeouts          │
//! │  retry.rs        - Exponential backoff for transient errors │
//! │  ledger.rs       - Session ledger (GraphQL, in-memory)      │
//! │  transport.rs    - Proof submission (HTTP, recording)       │
//! │  context.rs      - Device identifiers + UI events           │
//! │  orchestrator.rs - End-to-end rotation                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod ledger;
pub mod orchestrator;
pub mod retry;
pub mod transport;

pub use config::{ConfigError, RotationConfig};
pub use context::{DeviceContext, DeviceEvent};
pub use ledger::{GraphQlLedger, InMemoryLedger, LedgerError, SessionLedger};
pub use orchestrator::{
    select_session_key, PreparedRotation, RotationError, RotationOrchestrator, RotationReceipt,
    RotationStatus,
};
pub use retry::{RetryPolicy, Transient};
pub use transport::{HttpTransport, ProofTransport, RecordingTransport, TransportError};
