use crate::consensus::types::Epoch;
use crate::duties::selector::SelectionPolicy;
use crate::node::config::DutiesConfig;
use crate::node::Node;
use crate::utils::logging::init_logging;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI for the duty service.
#[derive(Parser, Debug)]
#[clap(name = "epoch-duties", version)]
pub struct Cli {
    /// Path to a TOML config file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[clap(long)]
    pub log_level: Option<String>,

    /// Directory of retained snapshots (slot-<n>.json)
    #[clap(long)]
    pub snapshots_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Serve the JSON-RPC api until Ctrl+C
    Serve {
        /// rpc bind address (host:port)
        #[clap(long)]
        rpc: Option<String>,
    },
    /// Print minimal consensus info from an epoch up to the retained head
    ConsensusInfo {
        #[clap(long, default_value_t = 0)]
        from_epoch: Epoch,
    },
    /// Print the proposer list of an epoch (current epoch when omitted)
    Proposers {
        #[clap(long)]
        epoch: Option<Epoch>,
    },
}

impl Cli {
    /// Config file (or defaults) with command line overrides applied.
    pub fn resolve_config(&self) -> Result<DutiesConfig> {
        let mut cfg = match &self.config {
            Some(path) => DutiesConfig::load(path)?,
            None => DutiesConfig::default(),
        };
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        if let Some(dir) = &self.snapshots_dir {
            cfg.storage.snapshots_dir = Some(dir.clone());
        }
        if let Cmd::Serve { rpc: Some(addr) } = &self.cmd {
            cfg.rpc.listen_addr = addr.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;
    init_logging(&cfg.log_level);

    let node = Node::new(cfg);
    match cli.cmd {
        Cmd::Serve { .. } => {
            let (svc, addr) = node.start().await?;
            info!("Serving duties on {}", addr);
            // Wait for Ctrl+C
            tokio::signal::ctrl_c().await?;
            println!("Shutting down...");
            svc.shutdown().await?;
            println!("Stopped");
            Ok(())
        }
        Cmd::ConsensusInfo { from_epoch } => {
            let services = node.build_services()?;
            let cancel = CancellationToken::new();
            let records = services.consensus_info.get_range(from_epoch, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Cmd::Proposers { epoch } => {
            let services = node.build_services()?;
            let cancel = CancellationToken::new();
            let proposers = &services.proposers;
            let list = match epoch {
                Some(epoch) => {
                    proposers
                        .proposer_list_for_epoch(epoch, SelectionPolicy::Live, &cancel)
                        .await?
                }
                None => proposers.next_epoch_proposer_list(&cancel).await?,
            };
            println!("{}", serde_json::to_string_pretty(&list)?);
            Ok(())
        }
    }
}
