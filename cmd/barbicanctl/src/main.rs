use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Args, Parser, Subcommand};
use pkg_constants::keymanager::DEFAULT_PAYLOAD_CONTENT_TYPE;
use pkg_constants::network::{DEFAULT_KEYMANAGER_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS};
use pkg_constants::paths::DEFAULT_CONFIG;
use pkg_keymanager::{BarbicanClient, ClientConfig};
use pkg_metrics::MetricsRegistry;
use pkg_secrets::{SecretManager, parse_secret_id};
use pkg_types::config::{KeyManagerConfigFile, load_config_file};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "barbicanctl", about = "Manage Barbican secrets by name")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_CONFIG)]
    config: String,

    /// Barbican endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Keystone token sent as X-Auth-Token
    #[arg(long)]
    token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Print request metrics (Prometheus text) to stderr when done
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reference of a secret, creating it if it does not exist
    Ensure(WriteArgs),
    /// Show the secret with the given name
    Get {
        name: String,
    },
    /// Create a secret unconditionally
    Create(WriteArgs),
    /// Delete every opaque secret whose name contains PART_NAME
    Delete {
        part_name: String,
    },
    /// Print the ID part of a secret reference
    ParseId {
        reference: String,
    },
}

#[derive(Args)]
struct WriteArgs {
    name: String,

    /// Content type of the payload
    #[arg(long, default_value = DEFAULT_PAYLOAD_CONTENT_TYPE)]
    secret_type: String,

    #[command(flatten)]
    payload: PayloadArgs,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PayloadArgs {
    /// Base64-encoded payload
    #[arg(long)]
    payload: Option<String>,

    /// Read the payload from a file and base64-encode it
    #[arg(long)]
    payload_file: Option<PathBuf>,
}

impl PayloadArgs {
    async fn resolve(&self) -> anyhow::Result<String> {
        match (&self.payload, &self.payload_file) {
            (Some(payload), _) => Ok(payload.clone()),
            (None, Some(path)) => {
                let raw = tokio::fs::read(path).await.map_err(|e| {
                    anyhow::anyhow!("Failed to read payload file {}: {}", path.display(), e)
                })?;
                Ok(STANDARD.encode(raw))
            }
            (None, None) => anyhow::bail!("either --payload or --payload-file is required"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: KeyManagerConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let endpoint = cli
        .endpoint
        .clone()
        .or(file_cfg.endpoint)
        .unwrap_or_else(|| DEFAULT_KEYMANAGER_ENDPOINT.to_string());
    let token = cli.token.clone().or(file_cfg.token);
    let timeout_secs = cli
        .timeout_secs
        .or(file_cfg.timeout_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let insecure = cli.insecure || file_cfg.insecure.unwrap_or(false);

    info!("Barbican endpoint: {}", endpoint);
    if token.is_none() {
        warn!("No token configured; requests will be unauthenticated");
    }

    let client = BarbicanClient::new(ClientConfig {
        endpoint,
        token,
        timeout: Duration::from_secs(timeout_secs),
        insecure,
    })?;
    let metrics = Arc::new(MetricsRegistry::new());
    let manager = SecretManager::new(client, metrics.clone());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            on_signal.cancel();
        }
    });

    let result = run(&cli.command, &manager, &cancel).await;

    if cli.metrics {
        eprint!("{}", metrics.render());
    }
    result
}

async fn run(
    command: &Commands,
    manager: &SecretManager<BarbicanClient>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Commands::Ensure(args) => {
            let payload = args.payload.resolve().await?;
            let secret_ref = manager
                .ensure_secret(&args.name, &args.secret_type, &payload, cancel)
                .await?;
            println!("{}", secret_ref);
        }
        Commands::Get { name } => {
            let secret = manager.get_secret(name, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&secret)?);
        }
        Commands::Create(args) => {
            let payload = args.payload.resolve().await?;
            let secret_ref = manager
                .create_secret(&args.name, &args.secret_type, &payload, cancel)
                .await?;
            println!("{}", secret_ref);
        }
        Commands::Delete { part_name } => {
            let deleted = manager.delete_secrets(part_name, cancel).await?;
            println!("Deleted {} secret(s) matching '{}'", deleted, part_name);
        }
        Commands::ParseId { reference } => {
            println!("{}", parse_secret_id(reference)?);
        }
    }
    Ok(())
}
