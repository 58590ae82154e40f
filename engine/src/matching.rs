//! Per-(wallet, contract) decision: already verified, no match, not yet
//! confirmed enough, or matched.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use chaingate_chain::{ChainAnswer, ChainQueryPort};
use chaingate_store::EngineStore;
use chaingate_types::{ContractDefinition, ContractId, TxHash, WalletAddress};

use crate::{EngineMetrics, MatchError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A verified record exists; the chain was not consulted.
    AlreadyVerified,
    NoMatch,
    /// Found, but below threshold. Re-checked next cycle.
    InsufficientConfirmations {
        tx_hash: TxHash,
        have: u64,
        need: u64,
    },
    Matched {
        tx_hash: TxHash,
        block_number: u64,
        confirmations: u64,
    },
}

pub struct MatchingEngine {
    store: Arc<dyn EngineStore>,
    chain: Arc<dyn ChainQueryPort>,
    /// Threshold for contracts that do not set their own.
    default_confirmations: u64,
    query_timeout: Duration,
    metrics: Arc<EngineMetrics>,
}

impl MatchingEngine {
    pub fn new(
        store: Arc<dyn EngineStore>,
        chain: Arc<dyn ChainQueryPort>,
        default_confirmations: u64,
        query_timeout: Duration,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            chain,
            default_confirmations,
            query_timeout,
            metrics,
        }
    }

    pub async fn check(
        &self,
        wallet: &WalletAddress,
        contract: &ContractDefinition,
    ) -> Result<MatchOutcome, MatchError> {
        if self.store.is_verified(wallet, &contract.id)? {
            return Ok(MatchOutcome::AlreadyVerified);
        }

        let query = self.chain.query(wallet, contract);
        let answer = match tokio::time::timeout(self.query_timeout, query).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                self.metrics.chain_errors.inc();
                return Err(MatchError::Chain(e));
            }
            Err(_) => {
                self.metrics.chain_errors.inc();
                return Err(MatchError::Timeout(self.query_timeout));
            }
        };

        let need = contract.effective_confirmations(self.default_confirmations);
        Ok(match answer {
            ChainAnswer::NotFound => MatchOutcome::NoMatch,
            ChainAnswer::Found {
                tx_hash,
                confirmations,
                ..
            } if confirmations < need => MatchOutcome::InsufficientConfirmations {
                tx_hash,
                have: confirmations,
                need,
            },
            ChainAnswer::Found {
                tx_hash,
                block_number,
                confirmations,
            } => MatchOutcome::Matched {
                tx_hash,
                block_number,
                confirmations,
            },
        })
    }

    /// Evaluate every contract concurrently. One contract's failure never
    /// touches another's result; results come back in input order.
    pub async fn check_all(
        &self,
        wallet: &WalletAddress,
        contracts: &[&ContractDefinition],
    ) -> Vec<(ContractId, Result<MatchOutcome, MatchError>)> {
        let checks = contracts.iter().map(|contract| async move {
            let outcome = self.check(wallet, contract).await;
            if let Err(e) = &outcome {
                tracing::warn!(contract = %contract.id, error = %e, "contract check failed");
            }
            (contract.id.clone(), outcome)
        });
        join_all(checks).await
    }
}
