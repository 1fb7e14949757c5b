//! VeriLeaf daemon: runs the registry node and provides client-side tooling
//! for keys, signed calls and impact assessments.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use zeroize::Zeroizing;

use verileaf_crypto::{generate_keypair, keypair_from_seed};
use verileaf_node::{init_logging, NodeConfig, RegistryNode};
use verileaf_registry::{ImpactAssessment, VegetationMetrics};
use verileaf_rpc::{calls, SignedCall};
use verileaf_types::{Identity, KeyPair, Timestamp};

#[derive(Parser)]
#[command(name = "verileaf-daemon", about = "VeriLeaf claim-and-score registry daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the registry node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Generate an Ed25519 key and print its identity and hex seed.
    Keygen {
        /// Write the hex seed to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Produce a signed call body for a write endpoint.
    Sign {
        call: CallName,
        /// File containing the hex-encoded 32-byte seed.
        #[arg(long, env = "VERILEAF_KEY_FILE")]
        key: PathBuf,
        /// The call payload as JSON.
        #[arg(long)]
        payload: String,
        /// Issue time in unix seconds; defaults to now.
        #[arg(long)]
        issued_at: Option<u64>,
    },
    /// Score the change between two vegetation metric summaries.
    Assess {
        /// JSON file with the metrics before the intervention.
        #[arg(long)]
        before: PathBuf,
        /// JSON file with the metrics after the intervention.
        #[arg(long)]
        after: PathBuf,
    },
}

#[derive(Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to a TOML configuration file. File settings are the base; flags
    /// and env vars override them.
    #[arg(long, env = "VERILEAF_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "VERILEAF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// RPC server port.
    #[arg(long, env = "VERILEAF_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable the WebSocket server.
    #[arg(long, env = "VERILEAF_ENABLE_WEBSOCKET")]
    websocket: bool,

    /// WebSocket server port.
    #[arg(long, env = "VERILEAF_WS_PORT")]
    websocket_port: Option<u16>,

    /// Identity that constructs the registry on first start.
    #[arg(long, env = "VERILEAF_OWNER")]
    owner: Option<Identity>,

    /// Verifier at first construction; the owner when unset.
    #[arg(long, env = "VERILEAF_INITIAL_VERIFIER")]
    initial_verifier: Option<Identity>,

    /// Allow cross-origin requests from any origin.
    #[arg(long, env = "VERILEAF_CORS_ALLOW_ANY")]
    cors_allow_any: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VERILEAF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VERILEAF_LOG_FORMAT")]
    log_format: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CallName {
    RegisterClaim,
    SubmitImpactScore,
    SetVerifier,
}

impl CallName {
    fn as_str(self) -> &'static str {
        match self {
            CallName::RegisterClaim => calls::REGISTER_CLAIM,
            CallName::SubmitImpactScore => calls::SUBMIT_IMPACT_SCORE,
            CallName::SetVerifier => calls::SET_VERIFIER,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Node {
            action: NodeAction::Run(args),
        } => run_node(args).await,
        Command::Keygen { out } => keygen(out.as_deref()),
        Command::Sign {
            call,
            key,
            payload,
            issued_at,
        } => sign(call, &key, &payload, issued_at),
        Command::Assess { before, after } => assess(&before, &after),
    }
}

async fn run_node(args: RunArgs) -> anyhow::Result<()> {
    let base = match &args.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NodeConfig::default(),
    };

    let config = NodeConfig {
        data_dir: args.data_dir.unwrap_or(base.data_dir),
        rpc_port: args.rpc_port.unwrap_or(base.rpc_port),
        enable_websocket: args.websocket || base.enable_websocket,
        websocket_port: args.websocket_port.unwrap_or(base.websocket_port),
        owner: args.owner.or(base.owner),
        initial_verifier: args.initial_verifier.or(base.initial_verifier),
        cors_allow_any: args.cors_allow_any || base.cors_allow_any,
        log_level: args.log_level.unwrap_or(base.log_level),
        log_format: args.log_format.unwrap_or(base.log_format),
        ..base
    };

    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = &args.config {
        tracing::info!(path = %path.display(), "loaded config");
    }
    tracing::info!(
        rpc_port = config.rpc_port,
        websocket = config.enable_websocket,
        "starting VeriLeaf node"
    );

    let mut node = RegistryNode::new(config)?;
    node.run().await?;
    Ok(())
}

fn keygen(out: Option<&Path>) -> anyhow::Result<()> {
    let keypair = generate_keypair();
    let seed = Zeroizing::new(hex::encode(keypair.private.0));

    println!("identity: {}", keypair.identity());
    match out {
        Some(path) => {
            std::fs::write(path, seed.as_bytes())
                .with_context(|| format!("writing seed to {}", path.display()))?;
            println!("seed written to {}", path.display());
        }
        None => println!("seed: {}", seed.as_str()),
    }
    Ok(())
}

fn load_keypair(path: &Path) -> anyhow::Result<KeyPair> {
    let text = Zeroizing::new(
        std::fs::read_to_string(path)
            .with_context(|| format!("reading key file {}", path.display()))?,
    );
    let bytes = Zeroizing::new(hex::decode(text.trim()).context("key file is not hex")?);
    let mut seed = Zeroizing::new([0u8; 32]);
    if bytes.len() != seed.len() {
        bail!("key file must hold a 32-byte seed, found {} bytes", bytes.len());
    }
    seed.copy_from_slice(&bytes);
    Ok(keypair_from_seed(&seed))
}

fn sign(call: CallName, key: &Path, payload: &str, issued_at: Option<u64>) -> anyhow::Result<()> {
    let keypair = load_keypair(key)?;
    let payload: Value = serde_json::from_str(payload).context("payload is not JSON")?;
    let issued_at = issued_at.map(Timestamp::new).unwrap_or_else(Timestamp::now);

    let signed = SignedCall::sign(&keypair, call.as_str(), issued_at, &payload)?;
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}

fn read_metrics(path: &Path) -> anyhow::Result<VegetationMetrics> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading metrics {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing metrics {}", path.display()))
}

fn assess(before: &Path, after: &Path) -> anyhow::Result<()> {
    let assessment = ImpactAssessment::from_metrics(&read_metrics(before)?, &read_metrics(after)?);
    let mut report = serde_json::to_value(&assessment)?;
    report["submittable_score"] = assessment.score().value().into();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
