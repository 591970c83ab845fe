use crate::consensus::spec::ChainSpec;
use crate::duties::consensus_info::ScanConfig;
use crate::duties::pagination::PaginationConfig;
use crate::duties::ServiceConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_RPC_ADDR: &str = "127.0.0.1:4000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub listen_addr: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { listen_addr: DEFAULT_RPC_ADDR.to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of `slot-<n>.json` snapshots. In-memory store when unset.
    pub snapshots_dir: Option<PathBuf>,
}

/// Node configuration, loaded from TOML. Every section and field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutiesConfig {
    pub log_level: String,
    pub chain: ChainSpec,
    pub pagination: PaginationConfig,
    pub scan: ScanConfig,
    pub rpc: RpcConfig,
    pub storage: StorageConfig,
}

impl Default for DutiesConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            chain: ChainSpec::default(),
            pagination: PaginationConfig::default(),
            scan: ScanConfig::default(),
            rpc: RpcConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl DutiesConfig {
    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let cfg: DutiesConfig = toml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(e) = self.chain.validate() {
            bail!("invalid chain config: {}", e);
        }
        let PaginationConfig { default_page_size, max_page_size } = self.pagination;
        if default_page_size == 0 || default_page_size > max_page_size {
            bail!(
                "invalid pagination config: default page size {} must be in 1..={}",
                default_page_size,
                max_page_size
            );
        }
        if self.scan.lookahead == 0 {
            bail!("invalid scan config: lookahead must be at least 1");
        }
        self.rpc_addr()?;
        Ok(())
    }

    pub fn rpc_addr(&self) -> Result<SocketAddr> {
        self.rpc
            .listen_addr
            .parse()
            .with_context(|| format!("invalid rpc listen address {:?}", self.rpc.listen_addr))
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            chain: self.chain.clone(),
            pagination: self.pagination,
            scan: self.scan,
        }
    }
}
