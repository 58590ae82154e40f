//! The query capability the matching engine depends on.

use async_trait::async_trait;

use chaingate_types::{ContractDefinition, TxHash, WalletAddress};

use crate::ChainError;

/// Answer to a single `(wallet, contract)` lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainAnswer {
    /// No qualifying transaction inside the search window.
    NotFound,
    /// The most recent qualifying transaction.
    Found {
        tx_hash: TxHash,
        block_number: u64,
        /// Blocks mined on top of (and including) the transaction's block.
        confirmations: u64,
    },
}

/// Looks up wallet-to-contract transactions on chain.
///
/// Implementations must be safe to call concurrently from many workers.
#[async_trait]
pub trait ChainQueryPort: Send + Sync {
    /// Find the most recent successful transaction from `wallet` to
    /// `contract.address` within the implementation's search window.
    async fn query(
        &self,
        wallet: &WalletAddress,
        contract: &ContractDefinition,
    ) -> Result<ChainAnswer, ChainError>;

    /// Current head of the contract's chain; doubles as a connectivity probe.
    async fn latest_block(&self, contract: &ContractDefinition) -> Result<u64, ChainError>;
}
