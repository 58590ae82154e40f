use std::time::Duration;

use thiserror::Error;

use chaingate_chain::ChainError;
use chaingate_sink::SinkError;
use chaingate_store::StoreError;
use chaingate_types::{IdentityId, TypesError, WalletAddress};

/// Fatal errors: raised while building or starting the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("chain client setup failed: {0}")]
    ChainClient(#[from] ChainError),

    #[error("sink client setup failed: {0}")]
    SinkClient(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure evaluating one `(wallet, contract)` pair. Contained per contract.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("store read failed: {0}")]
    Store(#[from] StoreError),

    #[error("chain query failed: {0}")]
    Chain(#[from] ChainError),

    #[error("chain query timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of one user's routine. Contained per user; the wallet stays pending.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("failed to record verification for {wallet}: {source}")]
    StoreWrite {
        wallet: WalletAddress,
        #[source]
        source: StoreError,
    },
}

/// Errors surfaced to whoever issued a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0} has not linked a wallet")]
    NotLinked(IdentityId),

    #[error("{identity} is already linked to {wallet}")]
    AlreadyLinked {
        identity: IdentityId,
        wallet: WalletAddress,
    },

    #[error("wallet {0} is already linked to another identity")]
    WalletTaken(WalletAddress),

    #[error("contract \"{requested}\" not found; available contracts: {available}")]
    UnknownContract { requested: String, available: String },

    #[error("invalid input: {0}")]
    Invalid(#[from] TypesError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
