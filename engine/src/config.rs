//! Engine configuration with TOML file support.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use chaingate_types::{ChannelId, ContractDefinition, ContractId, RoleId, WalletAddress};

use crate::scheduler::SchedulerConfig;
use crate::EngineError;

/// Upper bound on configured contracts.
pub const MAX_CONTRACTS: usize = 10;

/// Configuration for a chaingate engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Immutable once the engine starts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub chain: ChainSettings,

    #[serde(default)]
    pub sink: SinkSettings,

    /// Whether to serve `/metrics` and `/health`.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Contracts in configured order; the order drives per-user evaluation.
    #[serde(default)]
    pub contracts: Vec<ContractDefinition>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Pause after each wallet, per worker.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSettings {
    /// Default threshold `C` for contracts that do not set their own.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u64,
    /// Search window `W` in blocks.
    #[serde(default = "default_search_blocks")]
    pub search_blocks: u64,
    /// Per HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per full `(wallet, contract)` query, across every request it makes.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_block_batch")]
    pub block_batch: usize,
    #[serde(default = "default_chain_name")]
    pub chain_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SinkSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot token. Never written back out.
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default)]
    pub guild_id: String,
    /// Fallback announcement channel for contracts without their own.
    #[serde(default)]
    pub verification_channel_id: Option<ChannelId>,
    #[serde(default = "default_true")]
    pub dm_notifications: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./chaingate_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    300
}

fn default_max_batch_size() -> usize {
    10
}

fn default_max_concurrent() -> usize {
    10
}

fn default_chunk_delay_ms() -> u64 {
    100
}

fn default_min_confirmations() -> u64 {
    1
}

fn default_search_blocks() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_query_timeout_secs() -> u64 {
    120
}

fn default_block_batch() -> usize {
    25
}

fn default_chain_name() -> String {
    "Gensyn Testnet".to_string()
}

fn default_api_base() -> String {
    chaingate_sink::discord::DEFAULT_API_BASE.to_string()
}

fn default_metrics_port() -> u16 {
    9187
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            max_batch_size: default_max_batch_size(),
            max_concurrent: default_max_concurrent(),
            chunk_delay_ms: default_chunk_delay_ms(),
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            min_confirmations: default_min_confirmations(),
            search_blocks: default_search_blocks(),
            request_timeout_secs: default_request_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            block_batch: default_block_batch(),
            chain_name: default_chain_name(),
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: String::new(),
            guild_id: String::new(),
            verification_channel_id: None,
            dm_notifications: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Check everything that must hold before the engine starts.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.contracts.is_empty() {
            return Err(EngineError::Config(
                "at least one contract must be configured (address + role id + rpc url)".into(),
            ));
        }
        if self.contracts.len() > MAX_CONTRACTS {
            return Err(EngineError::Config(format!(
                "{} contracts configured, at most {MAX_CONTRACTS} are supported",
                self.contracts.len()
            )));
        }
        let mut seen = HashSet::new();
        for contract in &self.contracts {
            if !seen.insert(contract.id.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate contract id {}",
                    contract.id
                )));
            }
            if contract.rpc_url.trim().is_empty() {
                return Err(EngineError::Config(format!(
                    "contract {} has no rpc url",
                    contract.id
                )));
            }
        }
        if self.sink.token.trim().is_empty() {
            return Err(EngineError::Config(
                "sink.token is required (set DISCORD_TOKEN or --token)".into(),
            ));
        }
        if self.sink.guild_id.trim().is_empty() {
            return Err(EngineError::Config(
                "sink.guild_id is required (set DISCORD_GUILD_ID or --guild-id)".into(),
            ));
        }
        if self.scheduler.max_concurrent == 0 {
            return Err(EngineError::Config("scheduler.max_concurrent must be at least 1".into()));
        }
        if self.scheduler.max_batch_size == 0 {
            return Err(EngineError::Config("scheduler.max_batch_size must be at least 1".into()));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(EngineError::Config("scheduler.interval_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn contract_ids(&self) -> Vec<ContractId> {
        self.contracts.iter().map(|c| c.id.clone()).collect()
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.scheduler.interval_secs),
            max_batch_size: self.scheduler.max_batch_size,
            max_concurrent: self.scheduler.max_concurrent,
            chunk_delay: Duration::from_millis(self.scheduler.chunk_delay_ms),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.query_timeout_secs)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink.request_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            scheduler: SchedulerSettings::default(),
            chain: ChainSettings::default(),
            sink: SinkSettings::default(),
            enable_metrics: false,
            metrics_port: default_metrics_port(),
            contracts: Vec::new(),
        }
    }
}

/// Read `CONTRACT_{i}_ADDRESS`, `CONTRACT_{i}_ROLE_ID` and
/// `CONTRACT_{i}_RPC_URL` for `i` in `1..=10`.
///
/// Slots missing any of the three are skipped. Present-but-invalid values
/// are a configuration error.
pub fn contracts_from_env<F>(lookup: F) -> Result<Vec<ContractDefinition>, EngineError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut contracts = Vec::new();
    for i in 1..=MAX_CONTRACTS {
        let address = lookup(&format!("CONTRACT_{i}_ADDRESS"));
        let role = lookup(&format!("CONTRACT_{i}_ROLE_ID"));
        let rpc = lookup(&format!("CONTRACT_{i}_RPC_URL"));
        let (Some(address), Some(role), Some(rpc)) = (address, role, rpc) else {
            continue;
        };
        if address.is_empty() || role.is_empty() || rpc.is_empty() {
            continue;
        }
        let config_err = |e: chaingate_types::TypesError| {
            EngineError::Config(format!("CONTRACT_{i}: {e}"))
        };
        contracts.push(ContractDefinition {
            id: ContractId::new(format!("contract{i}")).map_err(config_err)?,
            name: format!("Contract {i}"),
            address: WalletAddress::parse(&address).map_err(config_err)?,
            role_id: RoleId::new(role).map_err(config_err)?,
            rpc_url: rpc,
            verification_channel_id: None,
            min_confirmations: None,
        });
    }
    Ok(contracts)
}
