//! Engine assembly: builds every component once and hands each its
//! dependencies explicitly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use chaingate_chain::{ChainQueryPort, EvmRpcClient, EvmRpcConfig};
use chaingate_sink::{DiscordConfig, DiscordSink, RoleSink};
use chaingate_store::EngineStore;
use chaingate_store_lmdb::store::DEFAULT_MAP_SIZE;
use chaingate_store_lmdb::LmdbStore;

use crate::{
    BatchScheduler, CommandService, EngineConfig, EngineError, EngineMetrics, MatchingEngine,
    ShutdownController, SideEffects, UserVerifier,
};

/// How long [`Engine::stop`] waits for tasks and an in-flight cycle.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Engine {
    pub config: EngineConfig,
    pub store: Arc<dyn EngineStore>,
    pub scheduler: Arc<BatchScheduler>,
    pub commands: Arc<CommandService>,
    pub metrics: Arc<EngineMetrics>,
    pub shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Open the LMDB store under `config.data_dir` and connect the real
    /// JSON-RPC and Discord clients.
    pub fn open(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let store = LmdbStore::open(&config.data_dir, DEFAULT_MAP_SIZE)
            .map_err(|e| EngineError::Store(e.into()))?;
        let chain = EvmRpcClient::new(EvmRpcConfig {
            search_blocks: config.chain.search_blocks,
            block_batch: config.chain.block_batch,
            request_timeout: Duration::from_secs(config.chain.request_timeout_secs),
        })?;
        let sink = DiscordSink::new(DiscordConfig {
            api_base: config.sink.api_base.clone(),
            token: config.sink.token.clone(),
            guild_id: config.sink.guild_id.clone(),
            request_timeout: config.sink_timeout(),
        })?;
        Self::with_parts(config, Arc::new(store), Arc::new(chain), Arc::new(sink))
    }

    /// Assemble an engine from arbitrary store, chain and sink implementations.
    pub fn with_parts(
        config: EngineConfig,
        store: Arc<dyn EngineStore>,
        chain: Arc<dyn ChainQueryPort>,
        sink: Arc<dyn RoleSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let metrics = Arc::new(EngineMetrics::new()?);
        let contracts = Arc::new(config.contracts.clone());

        let matcher = Arc::new(MatchingEngine::new(
            store.clone(),
            chain.clone(),
            config.chain.min_confirmations,
            config.query_timeout(),
            metrics.clone(),
        ));
        let effects = Arc::new(SideEffects::new(
            sink,
            config.sink.dm_notifications,
            config.sink.verification_channel_id.clone(),
            config.sink_timeout(),
            metrics.clone(),
        ));
        let verifier = Arc::new(UserVerifier::new(
            store.clone(),
            matcher.clone(),
            effects.clone(),
            contracts.clone(),
            metrics.clone(),
        ));
        let scheduler = Arc::new(BatchScheduler::new(
            store.clone(),
            verifier,
            config.contract_ids(),
            config.scheduler_config(),
            metrics.clone(),
        ));
        let commands = Arc::new(CommandService::new(
            store.clone(),
            chain,
            matcher,
            effects,
            scheduler.clone(),
            contracts,
            metrics.clone(),
        ));

        Ok(Self {
            config,
            store,
            scheduler,
            commands,
            metrics,
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    /// Start the scheduler loop (if enabled) and the metrics server (if enabled).
    pub async fn start(&mut self) -> Result<(), EngineError> {
        tracing::info!(
            chain = %self.config.chain.chain_name,
            contracts = self.config.contracts.len(),
            data_dir = %self.config.data_dir.display(),
            "chaingate engine starting"
        );
        for (i, contract) in self.config.contracts.iter().enumerate() {
            tracing::info!(
                index = i + 1,
                contract = %contract.id,
                name = %contract.name,
                address = %contract.address,
                role = %contract.role_id,
                "contract configured"
            );
        }

        if self.config.enable_metrics {
            let addr = SocketAddr::from(([0, 0, 0, 0], self.config.metrics_port));
            let listener_metrics = self.metrics.clone();
            let listener_scheduler = self.scheduler.clone();
            let shutdown_rx = self.shutdown.subscribe();
            self.task_handles.push(tokio::spawn(async move {
                if let Err(e) = crate::metrics_server::serve(
                    addr,
                    listener_metrics,
                    listener_scheduler,
                    shutdown_rx,
                )
                .await
                {
                    tracing::error!(error = %e, "metrics server failed");
                }
            }));
        }

        if self.config.scheduler.enabled {
            let handle = self.scheduler.start(self.shutdown.subscribe());
            self.task_handles.push(handle);
        } else {
            tracing::info!("automatic verification disabled");
        }
        Ok(())
    }

    /// Signal every task, then wait for them and for any in-flight cycle.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        tracing::info!("chaingate engine stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let scheduler = self.scheduler.clone();
        let wait_all = async move {
            for handle in handles {
                let _ = handle.await;
            }
            while scheduler.is_running() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), a cycle may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("chaingate engine stopped");
        Ok(())
    }
}
