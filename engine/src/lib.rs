//! The automated verification engine.
//!
//! Wires the store, the chain query port and the role sink together:
//! - [`MatchingEngine`] decides per `(wallet, contract)` pair.
//! - [`UserVerifier`] runs the per-user routine and its side effects.
//! - [`BatchScheduler`] drives periodic cycles over pending wallets.
//! - [`CommandService`] serves on-demand link/verify/status/stats requests.
//! - [`Engine`] owns all of the above plus the metrics server.

pub mod command;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod metrics_server;
pub mod scheduler;
pub mod shutdown;
pub mod tracing_spans;
pub mod worker;

pub use command::{
    ChainStatus, CommandService, ContractReport, ContractStatus, StatsReport, StatusReport,
    VerifyReport,
};
pub use config::{ChainSettings, EngineConfig, SchedulerSettings, SinkSettings};
pub use effects::SideEffects;
pub use engine::Engine;
pub use error::{CommandError, EngineError, MatchError, UserError};
pub use logging::{init_logging, LogFormat};
pub use matching::{MatchOutcome, MatchingEngine};
pub use metrics::EngineMetrics;
pub use scheduler::{BatchScheduler, CycleReport, CycleStats, SchedulerConfig};
pub use shutdown::ShutdownController;
pub use worker::{UserOutcome, UserVerifier};
