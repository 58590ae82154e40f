//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the engine (storage, chain, platform) has
//! an in-memory stand-in here that:
//! - Returns scripted values
//! - Can inject failures on demand
//! - Records what it was asked to do
//! - Never touches the filesystem or network
//!
//! Usage: hand these to the engine instead of LMDB, JSON-RPC and Discord.

pub mod chain;
pub mod sink;
pub mod store;

pub use chain::NullChain;
pub use sink::{NullSink, SinkFailure};
pub use store::NullStore;
