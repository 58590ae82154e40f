//! chaingate daemon: runs the verification engine, or a single command
//! against the same store.

mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use chaingate_engine::config::contracts_from_env;
use chaingate_engine::{init_logging, Engine, EngineConfig, LogFormat};
use chaingate_types::{ChannelId, IdentityId};

#[derive(Parser)]
#[command(name = "chaingate", about = "On-chain activity verification and role gating")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "CHAINGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "CHAINGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CHAINGATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Bot token for the chat platform.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Guild (server) the roles live in.
    #[arg(long, env = "DISCORD_GUILD_ID")]
    guild_id: Option<String>,

    /// Default channel for verification announcements.
    #[arg(long, env = "VERIFICATION_CHANNEL_ID")]
    verification_channel: Option<String>,

    /// Send members a direct message when they are verified.
    #[arg(long, env = "FEATURE_DM_NOTIFICATIONS")]
    dm_notifications: Option<bool>,

    /// Run periodic automatic verification.
    #[arg(long, env = "ENABLE_AUTO_VERIFY")]
    auto_verify: Option<bool>,

    /// Minutes between automatic verification cycles.
    #[arg(long, env = "AUTO_VERIFY_INTERVAL")]
    interval_mins: Option<u64>,

    /// Wallets checked per cycle.
    #[arg(long, env = "AUTO_VERIFY_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Wallets checked concurrently.
    #[arg(long, env = "MAX_CONCURRENT_VERIFICATIONS")]
    max_concurrent: Option<usize>,

    /// Pause in milliseconds after each wallet.
    #[arg(long, env = "DELAY_BETWEEN_CHECKS")]
    delay_ms: Option<u64>,

    /// Default confirmation threshold.
    #[arg(long, env = "MIN_CONFIRMATIONS")]
    min_confirmations: Option<u64>,

    /// Blocks searched back from the chain head.
    #[arg(long, env = "SEARCH_BLOCKS")]
    search_blocks: Option<u64>,

    #[arg(long, env = "CHAIN_NAME")]
    chain_name: Option<String>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "CHAINGATE_ENABLE_METRICS")]
    metrics: bool,

    #[arg(long, env = "CHAINGATE_METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Print command results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the engine until SIGINT/SIGTERM.
    Run,
    /// Link a wallet to an identity.
    Link {
        #[arg(long)]
        identity: String,
        #[arg(long)]
        wallet: String,
    },
    /// Verify an identity now, against all contracts or one.
    Verify {
        #[arg(long)]
        identity: String,
        /// Contract id or name (any case).
        #[arg(long)]
        contract: Option<String>,
    },
    /// Show an identity's verification status.
    Status {
        #[arg(long)]
        identity: String,
    },
    /// Show store, cycle and connectivity statistics.
    Stats,
    /// Run one verification cycle now.
    Cycle,
    /// List configured contracts.
    Contracts,
}

impl Cli {
    /// File (or defaults) first, then flags/env on top.
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                EngineConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => EngineConfig::default(),
        };

        if config.contracts.is_empty() {
            config.contracts = contracts_from_env(|key| std::env::var(key).ok())?;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(token) = &self.token {
            config.sink.token = token.clone();
        }
        if let Some(guild) = &self.guild_id {
            config.sink.guild_id = guild.clone();
        }
        if let Some(channel) = &self.verification_channel {
            config.sink.verification_channel_id = Some(ChannelId::new(channel.as_str())?);
        }
        if let Some(dm) = self.dm_notifications {
            config.sink.dm_notifications = dm;
        }
        if let Some(enabled) = self.auto_verify {
            config.scheduler.enabled = enabled;
        }
        if let Some(mins) = self.interval_mins {
            config.scheduler.interval_secs = mins * 60;
        }
        if let Some(size) = self.batch_size {
            config.scheduler.max_batch_size = size;
        }
        if let Some(n) = self.max_concurrent {
            config.scheduler.max_concurrent = n;
        }
        if let Some(ms) = self.delay_ms {
            config.scheduler.chunk_delay_ms = ms;
        }
        if let Some(c) = self.min_confirmations {
            config.chain.min_confirmations = c;
        }
        if let Some(w) = self.search_blocks {
            config.chain.search_blocks = w;
        }
        if let Some(name) = &self.chain_name {
            config.chain.chain_name = name.clone();
        }
        config.enable_metrics |= self.metrics;
        if let Some(port) = self.metrics_port {
            config.metrics_port = port;
        }
        Ok(config)
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", human(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.engine_config()?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    let mut engine = Engine::open(config).context("starting engine")?;

    match &cli.command {
        Command::Run => {
            engine.start().await?;
            engine.shutdown.wait_for_signal().await;
            tracing::info!("shutdown signal received, stopping engine");
            engine.stop().await?;
            tracing::info!("chaingate daemon exited cleanly");
        }
        Command::Link { identity, wallet } => {
            let link = engine.commands.link(&IdentityId::new(identity.as_str())?, wallet)?;
            emit(cli.json, &link, render::link)?;
        }
        Command::Verify { identity, contract } => {
            let report = engine
                .commands
                .verify_now(&IdentityId::new(identity.as_str())?, contract.as_deref())
                .await?;
            emit(cli.json, &report, render::verify)?;
        }
        Command::Status { identity } => {
            let status = engine.commands.status(&IdentityId::new(identity.as_str())?)?;
            emit(cli.json, &status, |s| render::status(s, engine.commands.contracts().len()))?;
        }
        Command::Stats => {
            let stats = engine.commands.stats().await?;
            emit(cli.json, &stats, |s| render::stats(s, &engine.config.chain.chain_name))?;
        }
        Command::Cycle => match engine.scheduler.run_cycle().await {
            Some(report) => println!(
                "cycle {}: {} checked, {} verified, {} failed in {}",
                report.run,
                report.checked,
                report.verified,
                report.failed,
                chaingate_utils::format_duration(report.duration.as_secs())
            ),
            None => println!("a cycle is already running"),
        },
        Command::Contracts => {
            emit(cli.json, &engine.config.contracts, |c| render::contracts(c))?;
        }
    }

    Ok(())
}
