//! The per-user verification routine run by each scheduler worker.

use std::sync::Arc;

use chaingate_store::{EngineStore, PendingWallet, RecordOutcome};
use chaingate_types::{ContractDefinition, ContractId, Timestamp};

use crate::{EngineMetrics, MatchOutcome, MatchingEngine, SideEffects, UserError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserOutcome {
    /// One contract newly verified; the rest wait for the next cycle.
    Verified(ContractId),
    NothingNew,
}

pub struct UserVerifier {
    store: Arc<dyn EngineStore>,
    matcher: Arc<MatchingEngine>,
    effects: Arc<SideEffects>,
    contracts: Arc<Vec<ContractDefinition>>,
    metrics: Arc<EngineMetrics>,
}

impl UserVerifier {
    pub fn new(
        store: Arc<dyn EngineStore>,
        matcher: Arc<MatchingEngine>,
        effects: Arc<SideEffects>,
        contracts: Arc<Vec<ContractDefinition>>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            matcher,
            effects,
            contracts,
            metrics,
        }
    }

    /// Walk the wallet's pending contracts in configured order and stop at
    /// the first new verification.
    ///
    /// A failing contract is skipped, not fatal. A failed store write ends
    /// the routine with no side effects so the wallet stays pending.
    pub async fn verify(&self, pending: &PendingWallet) -> Result<UserOutcome, UserError> {
        let ordered = self
            .contracts
            .iter()
            .filter(|c| pending.pending.contains(&c.id));

        for contract in ordered {
            let outcome = match self.matcher.check(&pending.wallet, contract).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(contract = %contract.id, error = %e, "check failed, skipping contract");
                    continue;
                }
            };

            let (tx_hash, block_number) = match outcome {
                MatchOutcome::Matched {
                    tx_hash,
                    block_number,
                    ..
                } => (tx_hash, block_number),
                MatchOutcome::InsufficientConfirmations { have, need, .. } => {
                    tracing::debug!(contract = %contract.id, have, need, "awaiting confirmations");
                    continue;
                }
                MatchOutcome::NoMatch | MatchOutcome::AlreadyVerified => continue,
            };

            let recorded = self
                .store
                .record_verification(
                    &pending.wallet,
                    &contract.id,
                    &tx_hash,
                    block_number,
                    Timestamp::now(),
                )
                .map_err(|source| {
                    self.metrics.store_write_failures.inc();
                    UserError::StoreWrite {
                        wallet: pending.wallet.clone(),
                        source,
                    }
                })?;

            if recorded == RecordOutcome::AlreadyVerified {
                tracing::debug!(contract = %contract.id, "verified concurrently, skipping role grant");
                continue;
            }

            self.metrics.verifications.inc();
            tracing::info!(contract = %contract.id, tx = %tx_hash, block = block_number, "auto-verified");
            let _ = self.effects.grant(&pending.identity, contract).await;
            self.effects
                .notify(&pending.identity, contract, &tx_hash)
                .await;
            self.effects.announce(&pending.identity, &[contract]).await;
            return Ok(UserOutcome::Verified(contract.id.clone()));
        }

        Ok(UserOutcome::NothingNew)
    }
}
