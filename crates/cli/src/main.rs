//! Svalbard CLI - command-line front-end for the sharing client.
//!
//! Drives `share-secret` and `recover-secret` against a fleet of custody
//! servers, with the sharing metadata kept in a local file. The exit code
//! is non-zero on any failure.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use prost::Message;
use zeroize::Zeroizing;

use svalbard_client::channel::FileSecondaryChannel;
use svalbard_client::peer::PeerDeviceShareManager;
use svalbard_client::printed::PrintedShareManager;
use svalbard_client::server_manager::ServerShareManager;
use svalbard_client::{ShareManagerRegistry, SvalbardClient};
use svalbard_proto::{LocationType, ShareLocation, SharedSecretMetadata};

#[derive(Parser)]
#[command(
    name = "svalbard",
    version,
    about = "Svalbard - distributed backup for short high-value secrets",
    long_about = "Splits a secret into shares kept by heterogeneous custodians and \
                  recovers it while enough of them survive. The sharing metadata \
                  written by share-secret is everything recovery needs besides the \
                  custodians themselves; keep it with a trusted provider."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory of the file-based secondary channel
    #[arg(long, global = true, default_value = ".")]
    channel_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Share a secret across the given locations
    ShareSecret(ShareSecretArgs),
    /// Recover a secret from its sharing metadata
    RecoverSecret(RecoverSecretArgs),
}

#[derive(Args)]
struct ShareSecretArgs {
    /// Name of the secret; custodians see this label
    #[arg(long)]
    secret_name: String,

    /// The secret value to back up
    #[arg(long)]
    secret_value: String,

    /// Minimum number of shares required for recovery
    #[arg(short = 'k', long)]
    threshold: u32,

    /// File the sharing metadata is written to
    #[arg(long)]
    metadata_file: PathBuf,

    /// A share location as TYPE,NAME,OWNER_ID_TYPE,OWNER_ID where TYPE is
    /// one of server, printed, peer; repeat once per share
    #[arg(long = "location", required = true)]
    locations: Vec<String>,
}

#[derive(Args)]
struct RecoverSecretArgs {
    /// File the sharing metadata is read from
    #[arg(long)]
    metadata_file: PathBuf,

    /// File the recovered secret is written to
    #[arg(long)]
    secret_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let runtime = tokio::runtime::Runtime::new().context("failed to start the runtime")?;
    match runtime.block_on(run(&cli)) {
        Ok(()) => Ok(()),
        Err(err) => {
            println!("Failure: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let client = build_client(&cli.channel_dir);
    match &cli.command {
        Commands::ShareSecret(args) => share_secret(&client, args, cli.quiet).await,
        Commands::RecoverSecret(args) => recover_secret(&client, args, cli.quiet).await,
    }
}

fn build_client(channel_dir: &PathBuf) -> SvalbardClient {
    let channel = Arc::new(FileSecondaryChannel::new(channel_dir));
    let mut registry = ShareManagerRegistry::new();
    registry.register(
        LocationType::SvalbardServer,
        Arc::new(ServerShareManager::new(channel)),
    );
    registry.register(LocationType::PrintedCopy, Arc::new(PrintedShareManager));
    registry.register(LocationType::PeerDevice, Arc::new(PeerDeviceShareManager));
    SvalbardClient::new(registry)
}

async fn share_secret(client: &SvalbardClient, args: &ShareSecretArgs, quiet: bool) -> Result<()> {
    let locations = args
        .locations
        .iter()
        .map(|spec| parse_location(spec))
        .collect::<Result<Vec<_>>>()?;
    let n = locations.len() as u32;
    let secret = Zeroizing::new(args.secret_value.clone().into_bytes());

    if !quiet {
        println!(
            "Performing a {}-out-of-{} sharing of [{}]...",
            args.threshold, n, args.secret_name
        );
    }
    let result = client
        .share(&args.secret_name, &secret, args.threshold, n, &locations)
        .await
        .context("sharing failed")?;

    std::fs::write(&args.metadata_file, result.metadata.encode_to_vec())
        .with_context(|| format!("could not write {}", args.metadata_file.display()))?;

    println!("Stored {} shares.", n as usize - result.shares_to_be_stored.len());
    for share_data in &result.shares_to_be_stored {
        let location_name = share_data
            .metadata
            .location
            .as_ref()
            .map(|location| location.location_name.as_str())
            .unwrap_or("<unknown>");
        if let Some(failure) = &share_data.failure {
            log::warn!("share for [{location_name}] must be stored manually: {failure}");
        }
    }
    Ok(())
}

async fn recover_secret(
    client: &SvalbardClient,
    args: &RecoverSecretArgs,
    _quiet: bool,
) -> Result<()> {
    let metadata_bytes = std::fs::read(&args.metadata_file)
        .with_context(|| format!("could not read {}", args.metadata_file.display()))?;
    let metadata = SharedSecretMetadata::decode(metadata_bytes.as_slice())
        .context("malformed sharing metadata")?;

    let result = client.recover(&metadata).await.context("recovery failed")?;

    for share_data in &result.share_data_list {
        if let (Some(failure), Some(location)) =
            (&share_data.failure, &share_data.metadata.location)
        {
            log::warn!(
                "share at [{}] not used: {failure}",
                location.location_name
            );
        }
    }

    std::fs::write(&args.secret_file, &result.secret)
        .with_context(|| format!("could not write {}", args.secret_file.display()))?;
    let valid_shares = result
        .share_data_list
        .iter()
        .filter(|share_data| share_data.failure.is_none())
        .count();
    println!("Recovered using {valid_shares} shares.");
    Ok(())
}

/// Parses `TYPE,NAME,OWNER_ID_TYPE,OWNER_ID` into a share location.
fn parse_location(spec: &str) -> Result<ShareLocation> {
    let parts: Vec<&str> = spec.splitn(4, ',').collect();
    if parts.len() != 4 {
        bail!("invalid location '{spec}': expected TYPE,NAME,OWNER_ID_TYPE,OWNER_ID");
    }
    let location_type = match parts[0] {
        "server" => LocationType::SvalbardServer,
        "printed" => LocationType::PrintedCopy,
        "peer" => LocationType::PeerDevice,
        other => bail!("unknown location type '{other}'"),
    };
    Ok(ShareLocation {
        location_type: location_type as i32,
        location_name: parts[1].to_string(),
        owner_id_type: parts[2].to_string(),
        owner_id: parts[3].to_string(),
    })
}

fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}
