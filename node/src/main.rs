//! HEALCHAIN dev host binary

use clap::{Parser, Subcommand};
use healchain_core::{NodeConfig, StorageBackend};
use healchain_fund::GenesisConfig;
use healchain_node::{init_logging, start_api_server, LogFormat, NodeRuntime};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "healchain-node")]
#[command(about = "HEALCHAIN - medical crowdfunding ledger dev host")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dev host
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Genesis file path; the devnet genesis is used when omitted
        #[arg(short, long)]
        genesis: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Keep state in memory only
        #[arg(long)]
        memory: bool,
    },

    /// Generate genesis configuration
    Genesis {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Chain name
        #[arg(long, default_value = "HEALCHAIN Devnet")]
        chain_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            genesis,
            api_addr,
            data_dir,
            memory,
        } => {
            let mut config = match config {
                Some(path) => NodeConfig::load(&path)?,
                None => NodeConfig::default(),
            };
            if let Some(api_addr) = api_addr {
                config.api.listen_addr = api_addr;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if memory {
                config.storage.backend = StorageBackend::Memory;
            }

            init_logging(&config.log_level, LogFormat::from_str_lossy(&config.log_format))?;
            info!(node = %config.name, "Starting HEALCHAIN dev host");

            let genesis_config = match genesis {
                Some(path) => GenesisConfig::from_json(&std::fs::read_to_string(&path)?)?,
                None => GenesisConfig::devnet(),
            };

            let listen_addr = config.api.listen_addr.clone();
            let runtime = Arc::new(NodeRuntime::open(config)?);
            runtime.initialize_genesis(genesis_config).await?;

            start_api_server(runtime, &listen_addr).await?;
        }

        Commands::Genesis { output, chain_name } => {
            let genesis = GenesisConfig {
                chain_name,
                ..GenesisConfig::devnet()
            };

            std::fs::write(&output, genesis.to_json()?)?;
            println!("Genesis configuration saved to: {}", output.display());
        }
    }

    Ok(())
}
