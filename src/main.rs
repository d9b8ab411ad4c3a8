//! Device Session CLI
//!
//! Computes device fingerprints, looks up and rotates sessions against a
//! ledger and submission service, and verifies rotation payloads.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use device_session::{
    identity::{canonicalize, fingerprint, IdentifierProbe, JsonFileProbe},
    proof::Prover,
    rotation::{
        DeviceContext, GraphQlLedger, HttpTransport, RotationConfig, RotationOrchestrator,
    },
    VERSION,
};

/// Hardware-bound game session rotation.
#[derive(Parser, Debug)]
#[command(name = "device-session", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the fingerprint of an identifier document.
    Fingerprint {
        /// Raw identifiers JSON file.
        #[arg(long)]
        identifiers: PathBuf,
    },

    /// Rotate the session key for a game.
    Rotate {
        /// Raw identifiers JSON file.
        #[arg(long)]
        identifiers: PathBuf,
        /// Game identifier.
        #[arg(long)]
        game_id: u64,
        /// Print the payload instead of submitting it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the session key the ledger holds for a game (0 when none).
    Session {
        /// Raw identifiers JSON file.
        #[arg(long)]
        identifiers: PathBuf,
        /// Game identifier.
        #[arg(long)]
        game_id: u64,
    },

    /// Verify a rotation payload.
    Verify {
        /// Payload JSON file.
        #[arg(long)]
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    info!("Device Session v{}", VERSION);

    let result = match cli.command {
        Commands::Fingerprint { identifiers } => run_fingerprint(identifiers),
        Commands::Rotate { identifiers, game_id, dry_run } => {
            run_rotate(identifiers, game_id, dry_run).await
        }
        Commands::Session { identifiers, game_id } => run_session(identifiers, game_id).await,
        Commands::Verify { payload } => run_verify(payload).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run_fingerprint(identifiers: PathBuf) -> anyhow::Result<u8> {
    let raw = JsonFileProbe::new(identifiers).probe()?;
    let canonical = canonicalize(&raw)?;
    println!("{}", fingerprint(&canonical));
    Ok(0)
}

type HttpOrchestrator = RotationOrchestrator<GraphQlLedger, HttpTransport>;

fn http_orchestrator() -> anyhow::Result<HttpOrchestrator> {
    let config = RotationConfig::from_env()?;
    let ledger = GraphQlLedger::new(config.ledger_url.clone(), config.request_timeout)?;
    let transport = HttpTransport::new(&config.submit_url, config.request_timeout)?;
    Ok(RotationOrchestrator::new(config, ledger, transport)?)
}

async fn probe_device(identifiers: PathBuf) -> anyhow::Result<DeviceContext> {
    let device = DeviceContext::new();
    let raw = JsonFileProbe::new(identifiers).probe()?;
    if let Err(e) = device.set_identifiers(raw).await {
        error!(error = %e, "Identifiers rejected");
    }
    Ok(device)
}

async fn run_session(identifiers: PathBuf, game_id: u64) -> anyhow::Result<u8> {
    let orchestrator = http_orchestrator()?;
    let device = probe_device(identifiers).await?;
    let key = orchestrator
        .current_session_key(&device, game_id)
        .await
        .context("session lookup failed")?;
    println!("{key}");
    Ok(0)
}

async fn run_rotate(identifiers: PathBuf, game_id: u64, dry_run: bool) -> anyhow::Result<u8> {
    let orchestrator = http_orchestrator()?;
    let device = probe_device(identifiers).await?;

    if dry_run {
        let prepared = orchestrator.prepare_rotation(&device, game_id).await?;
        println!("{}", prepared.payload);
        return Ok(0);
    }

    match orchestrator.rotate(&device, game_id).await {
        Ok(receipt) => {
            info!(
                attempt_id = %receipt.attempt_id,
                new_session_key = receipt.new_session_key(),
                submitted_at = %receipt.submitted_at,
                "Rotation complete"
            );
            println!("{}", device_session::rotation::RotationStatus::Success);
            Ok(0)
        }
        Err(e) => {
            println!("{}", e.status());
            Err(e).context("session rotation failed")
        }
    }
}

async fn run_verify(payload: PathBuf) -> anyhow::Result<u8> {
    let bytes = tokio::fs::read(&payload)
        .await
        .with_context(|| format!("reading {}", payload.display()))?;
    let valid = Prover::new(1).verify_payload(&bytes).await?;
    println!("{}", if valid { "valid" } else { "invalid" });
    Ok(if valid { 0 } else { 2 })
}
