use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use stepkeys_client::api::reqwest_based::ReqwestBased;
use stepkeys_client::api::stubs::InMemoryBackend;
use stepkeys_client::configuration::{self, ClientConfig};
use stepkeys_client::{PedalGateway, Settings, SharedTransport};

#[derive(Parser, Debug)]
#[command(name = "stepkeys")]
#[command(about = "Configure and control a StepKeys pedal board")]
struct Args {
    /// YAML file with `backend` and `timeout_ms`
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend origin, e.g. http://localhost:18000
    #[arg(long)]
    backend: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Talk to an in-process backend instead of the device service
    #[arg(long)]
    offline: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start-on-boot flag
    Boot {
        #[arg(long)]
        toggle: bool,
    },
    /// Device active flag
    Enabled {
        #[arg(long)]
        toggle: bool,
    },
    /// Check for a firmware update
    Update {
        /// Skip the backend's cached answer
        #[arg(long)]
        force: bool,
    },
    /// Stop the backend process
    Quit,
    Serial,
    Logs,
    ValidKeys,
    #[command(subcommand)]
    Pedals(PedalsCommand),
}

#[derive(Subcommand, Debug)]
enum PedalsCommand {
    /// Print the current mapping
    Get,
    /// Replace the whole mapping with the one in FILE (YAML or JSON)
    Set {
        file: PathBuf,
        /// Refuse to submit when a key is missing from the backend vocabulary
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    setup_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => configuration::load_from_yaml(path)?,
        None => ClientConfig::default(),
    }
    .with_overrides(args.backend.clone(), args.timeout_ms);

    let transport: SharedTransport = if args.offline {
        info!("using in-process backend");
        Arc::new(InMemoryBackend::new())
    } else {
        info!(backend = %config.backend, timeout_ms = config.timeout_ms, "using device backend");
        Arc::new(ReqwestBased::new(&config)?)
    };

    let settings = Settings::new(transport.clone());
    let gateway = PedalGateway::new(transport);

    match args.command {
        Command::Boot { toggle: false } => print(&settings.get_boot().await?),
        Command::Boot { toggle: true } => print(&settings.toggle_boot().await?),
        Command::Enabled { toggle: false } => print(&settings.get_enabled().await?),
        Command::Enabled { toggle: true } => print(&settings.toggle_enabled().await?),
        Command::Update { force } => print(&settings.get_update(force).await?),
        Command::Quit => match settings.quit_app().await {
            Ok(()) => info!("backend is shutting down"),
            Err(e) if e.is_connection_drop() => info!("backend closed the connection"),
            Err(e) => return Err(e.into()),
        },
        Command::Serial => print(&settings.get_serial().await?),
        Command::Logs => print(&settings.get_logs().await?),
        Command::ValidKeys => print(&settings.get_valid_keys().await?),
        Command::Pedals(PedalsCommand::Get) => print(&gateway.get_pedals().await?),
        Command::Pedals(PedalsCommand::Set { file, check }) => {
            let mapping = configuration::load_pedals_from_yaml(&file)?;

            if check {
                let valid = settings.get_valid_keys().await?;
                let unknown = mapping.unknown_keys(&valid);
                if !unknown.is_empty() {
                    for (pedal, key) in &unknown {
                        warn!(%pedal, key, "key not in backend vocabulary");
                    }
                    anyhow::bail!("{} unknown key(s), mapping not submitted", unknown.len());
                }
            }

            info!(pedals = mapping.len(), file = %file.display(), "submitting pedal mapping");
            let outcome = gateway.set_pedals(&mapping).await;
            print(&outcome);
            if let Some(message) = outcome.message() {
                anyhow::bail!("pedal mapping rejected: {message}");
            }
        }
    }

    Ok(())
}

fn print<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "couldn't render output"),
    }
}

fn setup_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();
}
