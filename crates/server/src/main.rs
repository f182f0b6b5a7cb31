//! Binary starting a Svalbard custody server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use svalbard_server::channel::FileChannel;
use svalbard_server::share_store::SledShareStore;
use svalbard_server::token_store::TokenStore;
use svalbard_server::{router, ServerState};

#[derive(Parser)]
#[command(
    name = "svalbard-server",
    version,
    about = "Svalbard custody server for secret shares"
)]
struct Args {
    /// Port on which the server listens for incoming requests
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Root directory for the file-based secondary channel
    #[arg(long)]
    filechannel_root_dir: PathBuf,

    /// Database file for the durable share store
    #[arg(long)]
    share_store_file: PathBuf,

    /// Validity period for short-lived tokens, in seconds
    #[arg(long, default_value_t = 5)]
    token_validity_secs: u64,

    /// Length of short-lived tokens
    #[arg(long, default_value_t = 5)]
    token_length: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let tokens = TokenStore::new(
        args.token_length,
        Duration::from_secs(args.token_validity_secs),
    )
    .context("could not set up the token store")?;
    let shares = SledShareStore::open(&args.share_store_file)
        .with_context(|| format!("could not open {}", args.share_store_file.display()))?;
    let channel = FileChannel::new(&args.filechannel_root_dir);
    let state = Arc::new(ServerState::new(tokens, Arc::new(shares), Arc::new(channel)));

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    tracing::info!(
        "starting Svalbard server on {addr}, secondary channel in {}",
        args.filechannel_root_dir.display()
    );
    tracing::warn!("serving plaintext HTTP; terminate TLS in front of this process");

    axum::serve(listener, router(state))
        .await
        .context("server failed")
}
