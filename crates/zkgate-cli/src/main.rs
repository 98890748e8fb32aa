//! zkgate command line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use zkgate_client::HttpBackendApi;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "zkgate", version, about = "Zero-knowledge event ticketing client")]
struct Cli {
    /// Config file path.
    #[arg(long, default_value = "zkgate.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate identity material and store the encrypted envelopes.
    SetupPassword {
        #[arg(long, env = "ZKGATE_PASSWORD")]
        password: String,
    },
    /// Request and store a ticket credential for an event.
    RequestTicket {
        #[arg(long)]
        event_id: String,
        #[arg(long, env = "ZKGATE_PASSWORD")]
        password: String,
    },
    /// Generate a proof for a stored ticket and print it as a QR code.
    Prove {
        #[arg(long)]
        event_id: String,
        #[arg(long, env = "ZKGATE_PASSWORD")]
        password: String,
        /// Write the proof JSON here instead of printing it.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Verify a proof against an event without recording attendance.
    Verify {
        #[arg(long)]
        event_id: String,
        /// File containing the proof JSON.
        #[arg(long)]
        proof: PathBuf,
    },
    /// Verify a scanned payload and record attendance in host mode.
    Checkin {
        #[arg(long)]
        event_id: String,
        /// Host admin code; without it the scan is verified only.
        #[arg(long)]
        admin_code: Option<String>,
        /// File containing the scanned payload (proof JSON or deep link).
        #[arg(long)]
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let api = HttpBackendApi::new(&config.base_url, config.token.clone())?;

    match cli.command {
        Command::SetupPassword { password } => {
            let commitment = commands::setup_password(&api, &password).await?;
            println!("identity commitment: {}", commitment);
        }
        Command::RequestTicket { event_id, password } => {
            println!(
                "{}",
                commands::request_ticket(&api, &password, &event_id).await?
            );
        }
        Command::Prove {
            event_id,
            password,
            output,
        } => {
            let (proof_json, qr) =
                commands::prove(&api, &password, &event_id, &config.deep_link_base).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &proof_json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("proof written to {}", path.display());
                }
                None => println!("{}", proof_json),
            }
            println!("{}", qr);
        }
        Command::Verify { event_id, proof } => {
            let proof_json = std::fs::read_to_string(&proof)
                .with_context(|| format!("reading {}", proof.display()))?;
            println!("{}", commands::verify(&api, &event_id, &proof_json).await?);
        }
        Command::Checkin {
            event_id,
            admin_code,
            payload,
        } => {
            let payload = std::fs::read_to_string(&payload)
                .with_context(|| format!("reading {}", payload.display()))?;
            println!(
                "{}",
                commands::checkin(api, &event_id, admin_code.as_deref(), payload.trim()).await?
            );
        }
    }

    Ok(())
}
