//! Sealgate server binary.
//!
//! Owns the process-wide keypair: generates it before anything is served,
//! rotates it on schedule and keeps the record store open until Ctrl-C.
//! Front ends embed [`sealgate_server::Gateway`] for the request surface.
//!
//! # Usage
//!
//! ```bash
//! # In-memory records, default 10 minute rotation
//! sealgate-server
//!
//! # Durable records, faster rotation
//! sealgate-server --store records.redb --rotation-secs 120
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use sealgate_core::ProtocolConfig;
use sealgate_server::{
    Gateway, MemoryRecordStore, RecordStore, RedbRecordStore, ServerConfig, ServerError, SystemEnv,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sealgate key lifecycle server
#[derive(Parser, Debug)]
#[command(name = "sealgate-server")]
#[command(about = "Hybrid-encryption key lifecycle and authorization server")]
#[command(version)]
struct Args {
    /// RSA modulus size in bits
    #[arg(long, default_value = "1024")]
    key_bits: usize,

    /// Seconds between key rotations
    #[arg(long, default_value = "600")]
    rotation_secs: u64,

    /// Seconds a key-update subscription waits before timing out
    #[arg(long, default_value = "630")]
    subscription_timeout_secs: u64,

    /// Seconds a one-time code stays valid
    #[arg(long, default_value = "600")]
    code_ttl_secs: u64,

    /// Marker plaintext clients encrypt to prove their session key
    #[arg(long, default_value = sealgate_core::DEFAULT_MARKER)]
    marker: String,

    /// Redb file for durable records (in-memory if omitted)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            key_bits: args.key_bits,
            rotation_interval: Duration::from_secs(args.rotation_secs),
            subscription_timeout: Duration::from_secs(args.subscription_timeout_secs),
            code_ttl: Duration::from_secs(args.code_ttl_secs),
            protocol: ProtocolConfig { marker: args.marker },
            store_path: args.store,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = ServerConfig::from(args);
    config.validate()?;

    tracing::info!("Sealgate server starting");

    match config.store_path.clone() {
        Some(path) => {
            tracing::info!(path = %path.display(), "opening record store");
            serve(config, RedbRecordStore::open(&path)?).await?;
        },
        None => {
            tracing::warn!("No record store path given - privileged sessions will not survive a restart");
            serve(config, MemoryRecordStore::new()).await?;
        },
    }

    Ok(())
}

async fn serve<S: RecordStore>(config: ServerConfig, store: S) -> Result<(), ServerError> {
    let rotation_interval = config.rotation_interval;
    let gateway = Gateway::new(config, store, SystemEnv::new())?;

    let rotation = gateway.keys().spawn_rotation(rotation_interval);
    tracing::info!(
        epoch = gateway.keys().epoch(),
        rotation_secs = rotation_interval.as_secs(),
        "serving"
    );

    tokio::signal::ctrl_c().await?;

    rotation.abort();
    tracing::info!(epoch = gateway.keys().epoch(), "shutting down");
    Ok(())
}
