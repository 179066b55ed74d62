//! prand daemon: generate keys, run a randomness server, run the client, or
//! verify a recorded run.

mod config;
mod keyfile;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use prand_crypto::{generate_keypair, StreamSeedSource};
use prand_network::{run_client, ConnectorConfig, ServerListener, ShutdownController};
use prand_protocol::{verify_transcript, ClientSession, RandomOutput, ServerIdentity, Transcript};
use prand_utils::LogFormat;
use serde::Serialize;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "prand", about = "Publicly verifiable distributed randomness")]
struct Cli {
    /// Path to the TOML deployment file.
    #[arg(long, default_value = "prand.toml", env = "PRAND_CONFIG")]
    config: PathBuf,

    /// Log format: "human" or "json". Overrides the config file.
    #[arg(long, env = "PRAND_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error". Overrides the
    /// config file.
    #[arg(long, env = "PRAND_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Generate a key pair, write the private key and print the public key.
    Keygen {
        #[arg(long)]
        out: PathBuf,
    },
    /// Serve sessions for the client named in the config file.
    Server {
        /// Listen address. Overrides the config file.
        #[arg(long, env = "PRAND_LISTEN")]
        listen: Option<String>,
        /// Private key file. Overrides the config file.
        #[arg(long, env = "PRAND_KEY_FILE")]
        key_file: Option<PathBuf>,
    },
    /// Run one session against every server and print the output.
    Client {
        /// Private key file. Overrides the config file.
        #[arg(long, env = "PRAND_KEY_FILE")]
        key_file: Option<PathBuf>,
        /// Write the signed transcript here for later verification.
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Check a recorded transcript and print the output it proves.
    Verify {
        #[arg(long)]
        transcript: PathBuf,
    },
}

#[derive(Serialize)]
struct OutputReport {
    value: String,
    dealers: Vec<u32>,
}

impl From<&RandomOutput> for OutputReport {
    fn from(output: &RandomOutput) -> Self {
        Self {
            value: hex::encode(output.value),
            dealers: output.dealers.clone(),
        }
    }
}

fn print_output(output: &RandomOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&OutputReport::from(output))?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Keygen { out } = &cli.command {
        let keypair = generate_keypair();
        keyfile::write_keypair(out, &keypair)?;
        println!("{}", keypair.public.to_hex());
        return Ok(());
    }

    let mut config = DaemonConfig::from_toml_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    prand_utils::init_tracing(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Keygen { .. } => Ok(()),
        Command::Server { listen, key_file } => {
            if let Some(listen) = listen {
                config.listen = listen;
            }
            if let Some(key_file) = key_file {
                config.key_file = key_file;
            }
            run_server(config).await
        }
        Command::Client {
            key_file,
            transcript,
        } => {
            if let Some(key_file) = key_file {
                config.key_file = key_file;
            }
            run_session(config, transcript.as_deref()).await
        }
        Command::Verify { transcript } => verify(&config, &transcript),
    }
}

async fn run_server(config: DaemonConfig) -> anyhow::Result<()> {
    let keypair = keyfile::load_keypair(&config.key_file)?;
    let index = config.server_index(&keypair.public)?;
    let identity = ServerIdentity::new(index, keypair, config.roster()?, config.client_key()?)?;

    let listener = ServerListener::bind(
        &config.listen,
        Arc::new(identity),
        config.session_config(),
        config.read_timeout(),
    )
    .await?;
    tracing::info!(
        server = index,
        t = config.threshold.t,
        r = config.threshold.r,
        n = config.threshold.n,
        "starting prand server on {}",
        config.listen
    );

    let shutdown = ShutdownController::new();
    let accept = tokio::spawn(listener.run(shutdown.subscribe()));
    shutdown.wait_for_signal().await;
    accept.await?;
    Ok(())
}

async fn run_session(config: DaemonConfig, transcript_path: Option<&Path>) -> anyhow::Result<()> {
    let keypair = keyfile::load_keypair(&config.key_file)?;
    if let Ok(expected) = config.client_key() {
        anyhow::ensure!(
            expected == keypair.public,
            "key file does not match client_public_key"
        );
    }

    let mut seeds = StreamSeedSource::from_entropy();
    let session = ClientSession::new(keypair, config.roster()?, config.threshold, &mut seeds)?;
    let connector = ConnectorConfig {
        connect_timeout: config.connect_timeout(),
        read_timeout: config.read_timeout(),
    };
    let (output, transcript) = run_client(session, &config.addresses(), &connector).await?;

    if let Some(path) = transcript_path {
        std::fs::write(path, transcript.to_bytes()?)
            .with_context(|| format!("writing transcript to {}", path.display()))?;
        tracing::info!("transcript written to {}", path.display());
    }
    print_output(&output)
}

fn verify(config: &DaemonConfig, path: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading transcript {}", path.display()))?;
    let transcript = Transcript::from_bytes(&bytes)?;
    let output = verify_transcript(
        config.threshold,
        &config.roster()?,
        &config.client_key()?,
        &transcript,
    )?;
    print_output(&output)
}
