//! Chain Query Port: answers "did this wallet send a qualifying transaction
//! to this contract recently, and how deep is it buried?"
//!
//! The engine only sees the [`ChainQueryPort`] trait. [`EvmRpcClient`] is the
//! production implementation, speaking Ethereum JSON-RPC over HTTP to the
//! endpoint configured for each contract.
//!
//! "Not found" is a normal answer, never an error.

pub mod client;
pub mod error;
pub mod port;
pub mod rpc;

pub use client::{EvmRpcClient, EvmRpcConfig};
pub use error::ChainError;
pub use port::{ChainAnswer, ChainQueryPort};
