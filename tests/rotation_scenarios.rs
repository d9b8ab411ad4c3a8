//! End-to-end rotation scenarios through the public API.
//!
//! - the three reference devices (A: fingerprint, B: rotation to key 42,
//!   C: malformed cpuId)
//! - fresh device (no prior session)
//! - rotation of an existing session
//! - device with an all-zero MAC
//! - proofs do not transfer between devices or games

use std::sync::atomic::{AtomicU32, Ordering};

use device_session::identity::{
    canonicalize, fingerprint, Fingerprint, IdentifierError, IdentifierField, RawIdentifiers,
};
use device_session::proof::{
    pipeline, ProofVerifier, Prover, RotationPublicInput, RotationPublicOutput, NO_SESSION_KEY,
};
use device_session::rotation::{
    DeviceContext, DeviceEvent, InMemoryLedger, LedgerError, RecordingTransport, RotationConfig,
    RotationError, RotationOrchestrator, RotationStatus, SessionLedger,
};

/// Published fingerprint of the reference device.
const REFERENCE_FINGERPRINT: &str =
    "26922200392623820773669273113614425887770215608133192819578327846556595054053";

fn reference_device() -> RawIdentifiers {
    RawIdentifiers {
        cpu_id: "AABBCCDD11223344".to_string(),
        system_serial: "SN123".to_string(),
        system_uuid: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        baseboard_serial: "BB456".to_string(),
        mac_address: vec!["AA:BB:CC:DD:EE:01".to_string(), "AA:BB:CC:DD:EE:02".to_string()],
        disk_serial: "DK789".to_string(),
    }
}

fn device_a() -> RawIdentifiers {
    RawIdentifiers {
        cpu_id: "BFEBFBFF000906EA".to_string(),
        system_serial: "SN123".to_string(),
        system_uuid: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        baseboard_serial: "BB456".to_string(),
        mac_address: vec!["AA:BB:CC:DD:EE:FF".to_string(), "11:22:33:44:55:66".to_string()],
        disk_serial: "DK789".to_string(),
    }
}

fn device_b() -> RawIdentifiers {
    RawIdentifiers {
        cpu_id: "178BFBFF00A20F10".to_string(),
        system_serial: "PF3XK2LM".to_string(),
        system_uuid: "9f2c1e44-0b7a-4d3e-8c11-5a6b7c8d9e0f".to_string(),
        baseboard_serial: "L1HF2AB01CD".to_string(),
        mac_address: vec!["d8-bb-c1-00-11-22".to_string(), "f4-26-79-aa-bb-cc".to_string()],
        disk_serial: "S4EWNX0R123456".to_string(),
    }
}

fn fingerprint_of(raw: &RawIdentifiers) -> Fingerprint {
    fingerprint(&canonicalize(raw).unwrap())
}

fn orchestrator<L: SessionLedger>(ledger: L) -> RotationOrchestrator<L, RecordingTransport> {
    let config = RotationConfig { max_concurrent_proofs: 2, ..RotationConfig::local().unwrap() };
    RotationOrchestrator::new(config, ledger, RecordingTransport::new()).unwrap()
}

/// Counts lookups, always answering "no session".
#[derive(Default)]
struct CountingLedger {
    calls: AtomicU32,
}

impl SessionLedger for CountingLedger {
    async fn current_session(&self, _: u64, _: &Fingerprint) -> Result<Option<String>, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn scenario_a_reference_fingerprint_is_stable() {
    let device = DeviceContext::new();
    let mut events = device.subscribe();
    device.set_identifiers(reference_device()).await.unwrap();
    let DeviceEvent::DeviceSet { fingerprint: first } = events.recv().await.unwrap();

    device.set_identifiers(reference_device()).await.unwrap();
    let DeviceEvent::DeviceSet { fingerprint: second } = events.recv().await.unwrap();

    assert_eq!(first, REFERENCE_FINGERPRINT);
    assert_eq!(second, first);

    let prepared = orchestrator(InMemoryLedger::new()).prepare_rotation(&device, 1).await.unwrap();
    assert_eq!(prepared.proof.public_input.game_id, 1);
    assert_eq!(prepared.proof.public_input.current_session_key, NO_SESSION_KEY);
    assert_eq!(prepared.fingerprint.to_decimal(), REFERENCE_FINGERPRINT);
    assert_eq!(prepared.proof.public_output.fingerprint.to_decimal(), REFERENCE_FINGERPRINT);
}

#[tokio::test]
async fn scenario_b_rotation_to_key_42_verifies() {
    let identifiers = canonicalize(&reference_device()).unwrap();
    let input = RotationPublicInput { game_id: 1, current_session_key: 0, new_session_key: 42 };

    let prover = Prover::new(1);
    let proof = prover.prove(input, identifiers).await.unwrap();

    assert_eq!(proof.public_output.game_id, 1);
    assert_eq!(proof.public_output.new_session_key, 42);
    assert_eq!(proof.public_output.fingerprint.to_decimal(), REFERENCE_FINGERPRINT);

    let ctx = pipeline::setup().unwrap();
    assert!(pipeline::verify(&ctx, &proof.public_input, &proof.public_output, &proof.proof));
    assert!(prover.verify(proof).await.unwrap());
}

#[tokio::test]
async fn scenario_c_malformed_cpu_id_fails_before_io() {
    let mut raw = reference_device();
    raw.cpu_id = "ZZZZ".to_string();
    assert_eq!(canonicalize(&raw).unwrap_err(), IdentifierError::InvalidFormat(IdentifierField::CpuId));

    let device = DeviceContext::new();
    assert!(device.set_identifiers(raw).await.is_err());

    let orchestrator = orchestrator(CountingLedger::default());
    let err = orchestrator.prepare_rotation(&device, 1).await.unwrap_err();
    assert!(matches!(
        err,
        RotationError::InvalidDevice(IdentifierError::InvalidFormat(IdentifierField::CpuId))
    ));
    assert_eq!(err.status(), RotationStatus::InvalidDeviceState);
    assert_eq!(orchestrator.ledger().calls.load(Ordering::SeqCst), 0);
    assert!(orchestrator.transport().submissions().unwrap().is_empty());
}

#[tokio::test]
async fn fresh_device_gets_first_session() {
    let device = DeviceContext::new();
    let mut events = device.subscribe();
    device.set_identifiers(device_a()).await.unwrap();

    let DeviceEvent::DeviceSet { fingerprint: announced } = events.recv().await.unwrap();
    assert_eq!(announced, fingerprint_of(&device_a()).to_decimal());

    let orchestrator = orchestrator(InMemoryLedger::new());
    let receipt = orchestrator.rotate(&device, 1).await.unwrap();
    let proof = &receipt.proof;

    assert_eq!(proof.public_input.game_id, 1);
    assert_eq!(proof.public_input.current_session_key, NO_SESSION_KEY);
    assert!((2..=10_000_000).contains(&proof.public_input.new_session_key));
    assert_eq!(proof.public_output.game_id, 1);
    assert_eq!(proof.public_output.new_session_key, proof.public_input.new_session_key);
    assert_eq!(proof.public_output.fingerprint.to_decimal(), announced);

    let ctx = pipeline::setup().unwrap();
    assert_eq!(ctx.verify_rotation(proof), Ok(true));
    assert_eq!(orchestrator.transport().submissions().unwrap().len(), 1);
}

#[tokio::test]
async fn existing_session_is_rotated() {
    let ledger = InMemoryLedger::new();
    ledger.insert(1, &fingerprint_of(&device_a()), "4242").await;

    let device = DeviceContext::new();
    device.set_identifiers(device_a()).await.unwrap();
    let orchestrator = orchestrator(ledger);

    let receipt = orchestrator.rotate(&device, 1).await.unwrap();
    let input = receipt.proof.public_input;
    assert_eq!(input.current_session_key, 4242);
    assert_ne!(input.new_session_key, 4242);
    assert!((2..=10_000_000).contains(&input.new_session_key));

    let ctx = pipeline::setup().unwrap();
    assert!(pipeline::verify(&ctx, &input, &receipt.proof.public_output, &receipt.proof.proof));
    assert!(pipeline::verify_payload(&ctx, receipt.payload.as_bytes()).unwrap());
}

#[tokio::test]
async fn zero_mac_device_is_rejected_before_io() {
    let mut raw = device_a();
    raw.mac_address[1] = "00:00:00:00:00:00".to_string();

    let device = DeviceContext::new();
    assert!(device.set_identifiers(raw).await.is_err());

    let orchestrator = orchestrator(CountingLedger::default());
    let status = orchestrator.rotate_with_status(&device, 1).await;

    assert_eq!(status, RotationStatus::InvalidDeviceState);
    assert_eq!(orchestrator.ledger().calls.load(Ordering::SeqCst), 0);
    assert!(orchestrator.transport().submissions().unwrap().is_empty());
}

#[tokio::test]
async fn proof_does_not_transfer_between_devices() {
    let device = DeviceContext::new();
    device.set_identifiers(device_a()).await.unwrap();
    let receipt = orchestrator(InMemoryLedger::new()).rotate(&device, 1).await.unwrap();

    let ctx = pipeline::setup().unwrap();
    let claimed_for_b = RotationPublicOutput {
        fingerprint: fingerprint_of(&device_b()),
        ..receipt.proof.public_output
    };
    assert!(!pipeline::verify(&ctx, &receipt.proof.public_input, &claimed_for_b, &receipt.proof.proof));
}

#[tokio::test]
async fn proof_does_not_transfer_between_games() {
    let device = DeviceContext::new();
    device.set_identifiers(device_b()).await.unwrap();
    let prepared = orchestrator(InMemoryLedger::new()).prepare_rotation(&device, 7).await.unwrap();

    let mut replayed = prepared.proof.clone();
    replayed.public_input.game_id = 8;
    replayed.public_output.game_id = 8;

    let ctx = pipeline::setup().unwrap();
    assert_eq!(ctx.verify_rotation(&prepared.proof), Ok(true));
    assert_eq!(ctx.verify_rotation(&replayed), Ok(false));
}

#[tokio::test]
async fn distinct_devices_have_distinct_ledger_keys() {
    let ledger = InMemoryLedger::new();
    ledger.insert(1, &fingerprint_of(&device_a()), "100").await;

    let device = DeviceContext::new();
    device.set_identifiers(device_b()).await.unwrap();
    let prepared = orchestrator(ledger).prepare_rotation(&device, 1).await.unwrap();
    assert_eq!(prepared.proof.public_input.current_session_key, NO_SESSION_KEY);
}
