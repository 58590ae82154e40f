//! On-demand commands: link a wallet, verify now, show status, show stats.
//!
//! `verify_now` goes through the same matching engine and the same
//! `record_verification` write as the scheduler, so a command racing a
//! cycle can never grant a role twice.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::Instrument;

use chaingate_chain::ChainQueryPort;
use chaingate_store::{EngineStore, RecordOutcome, StoreError, StoreStats};
use chaingate_types::{
    ContractDefinition, ContractId, IdentityId, IdentityLink, RoleId, Timestamp, TxHash,
    WalletAddress,
};
use chaingate_utils::percentage;

use crate::tracing_spans::command_span;
use crate::{
    BatchScheduler, CommandError, CycleStats, EngineMetrics, MatchError, MatchOutcome,
    MatchingEngine, SideEffects,
};

/// Result of `verify_now` for one contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ContractReport {
    Verified { role: RoleId, tx_hash: TxHash },
    /// Recorded as verified, but the role grant failed.
    VerifiedRoleFailed {
        role: RoleId,
        tx_hash: TxHash,
        reason: String,
    },
    AlreadyVerified,
    NotVerified { reason: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    pub wallet: WalletAddress,
    /// (contract id, display name, result) in configured order.
    pub results: Vec<(ContractId, String, ContractReport)>,
}

impl VerifyReport {
    pub fn newly_verified(&self) -> usize {
        self.results.iter().filter(|(_, _, r)| r.is_new()).count()
    }
}

impl ContractReport {
    /// True if this call wrote the verification record.
    pub fn is_new(&self) -> bool {
        matches!(
            self,
            ContractReport::Verified { .. } | ContractReport::VerifiedRoleFailed { .. }
        )
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ContractStatus {
    pub id: ContractId,
    pub name: String,
    pub verified: bool,
    pub tx_hash: Option<TxHash>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub wallet: WalletAddress,
    pub linked_at: Timestamp,
    pub contracts: Vec<ContractStatus>,
    pub verified_count: usize,
    pub progress_percent: u8,
}

/// Connectivity of one contract's RPC endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct ChainStatus {
    pub contract: ContractId,
    pub latest_block: Option<u64>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatsReport {
    pub store: StoreStats,
    /// Display names matching `store.per_contract`.
    pub contract_names: Vec<String>,
    pub cycles: CycleStats,
    pub chains: Vec<ChainStatus>,
}

pub struct CommandService {
    store: Arc<dyn EngineStore>,
    chain: Arc<dyn ChainQueryPort>,
    matcher: Arc<MatchingEngine>,
    effects: Arc<SideEffects>,
    scheduler: Arc<BatchScheduler>,
    contracts: Arc<Vec<ContractDefinition>>,
    metrics: Arc<EngineMetrics>,
}

impl CommandService {
    pub fn new(
        store: Arc<dyn EngineStore>,
        chain: Arc<dyn ChainQueryPort>,
        matcher: Arc<MatchingEngine>,
        effects: Arc<SideEffects>,
        scheduler: Arc<BatchScheduler>,
        contracts: Arc<Vec<ContractDefinition>>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            chain,
            matcher,
            effects,
            scheduler,
            contracts,
            metrics,
        }
    }

    pub fn contracts(&self) -> &[ContractDefinition] {
        &self.contracts
    }

    /// Link `wallet` (any case) to `identity`. A link is permanent.
    pub fn link(&self, identity: &IdentityId, wallet: &str) -> Result<IdentityLink, CommandError> {
        let _span = command_span("link", identity).entered();
        let wallet = WalletAddress::parse(wallet)?;

        match self.store.get_link(identity) {
            Ok(existing) => {
                return Err(CommandError::AlreadyLinked {
                    identity: identity.clone(),
                    wallet: existing.wallet,
                })
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        if self.store.get_link_by_wallet(&wallet)?.is_some() {
            return Err(CommandError::WalletTaken(wallet));
        }

        let link = self
            .store
            .link_wallet(identity, &wallet, Timestamp::now())
            .map_err(|e| match e {
                // Lost a race with a concurrent link.
                StoreError::Duplicate(_) => CommandError::WalletTaken(wallet.clone()),
                other => other.into(),
            })?;
        tracing::info!(wallet = %link.wallet, "wallet linked");
        Ok(link)
    }

    /// Verify `identity` now against every contract, or only the one whose
    /// id or name (any case) is `contract`.
    pub async fn verify_now(
        &self,
        identity: &IdentityId,
        contract: Option<&str>,
    ) -> Result<VerifyReport, CommandError> {
        self.verify_inner(identity, contract)
            .instrument(command_span("verify", identity))
            .await
    }

    async fn verify_inner(
        &self,
        identity: &IdentityId,
        contract: Option<&str>,
    ) -> Result<VerifyReport, CommandError> {
        let link = self.linked(identity)?;
        let selected = self.select(contract)?;

        let outcomes = self.matcher.check_all(&link.wallet, &selected).await;

        let mut results = Vec::with_capacity(selected.len());
        let mut newly = Vec::new();
        for (contract, (_, outcome)) in selected.iter().copied().zip(outcomes) {
            let report = self.settle(&link, contract, outcome).await;
            if report.is_new() {
                newly.push(contract);
            }
            results.push((contract.id.clone(), contract.name.clone(), report));
        }

        if !newly.is_empty() {
            self.effects.announce(identity, &newly).await;
        }
        Ok(VerifyReport {
            wallet: link.wallet,
            results,
        })
    }

    /// Turn one contract's match outcome into a report, writing and granting
    /// on a new match.
    async fn settle(
        &self,
        link: &IdentityLink,
        contract: &ContractDefinition,
        outcome: Result<MatchOutcome, MatchError>,
    ) -> ContractReport {
        let (tx_hash, block_number) = match outcome {
            Ok(MatchOutcome::AlreadyVerified) => return ContractReport::AlreadyVerified,
            Ok(MatchOutcome::NoMatch) => {
                return ContractReport::NotVerified {
                    reason: "no matching transaction found".into(),
                }
            }
            Ok(MatchOutcome::InsufficientConfirmations { have, need, .. }) => {
                return ContractReport::NotVerified {
                    reason: format!("insufficient confirmations (have {have}, need {need})"),
                }
            }
            Err(e) => {
                return ContractReport::NotVerified {
                    reason: format!("internal error: {e}"),
                }
            }
            Ok(MatchOutcome::Matched {
                tx_hash,
                block_number,
                ..
            }) => (tx_hash, block_number),
        };

        match self.store.record_verification(
            &link.wallet,
            &contract.id,
            &tx_hash,
            block_number,
            Timestamp::now(),
        ) {
            Ok(RecordOutcome::Recorded) => {}
            Ok(RecordOutcome::AlreadyVerified) => return ContractReport::AlreadyVerified,
            Err(e) => {
                self.metrics.store_write_failures.inc();
                tracing::error!(contract = %contract.id, error = %e, "failed to record verification");
                return ContractReport::NotVerified {
                    reason: format!("internal error: {e}"),
                };
            }
        }

        self.metrics.verifications.inc();
        tracing::info!(contract = %contract.id, tx = %tx_hash, "verified on demand");
        let granted = self.effects.grant(&link.identity, contract).await;
        self.effects.notify(&link.identity, contract, &tx_hash).await;
        match granted {
            Ok(()) => ContractReport::Verified {
                role: contract.role_id.clone(),
                tx_hash,
            },
            Err(e) => ContractReport::VerifiedRoleFailed {
                role: contract.role_id.clone(),
                tx_hash,
                reason: format!("role could not be granted: {e}"),
            },
        }
    }

    pub fn status(&self, identity: &IdentityId) -> Result<StatusReport, CommandError> {
        let _span = command_span("status", identity).entered();
        let link = self.linked(identity)?;

        let mut contracts = Vec::with_capacity(self.contracts.len());
        for contract in self.contracts.iter() {
            let record = self
                .store
                .get_record(&link.wallet, &contract.id)?
                .filter(|r| r.verified);
            contracts.push(ContractStatus {
                id: contract.id.clone(),
                name: contract.name.clone(),
                verified: record.is_some(),
                tx_hash: record.map(|r| r.tx_hash),
            });
        }
        let verified_count = contracts.iter().filter(|c| c.verified).count();
        Ok(StatusReport {
            wallet: link.wallet,
            linked_at: link.linked_at,
            progress_percent: percentage(verified_count as u64, contracts.len() as u64),
            verified_count,
            contracts,
        })
    }

    /// Store counts, cycle counters and a head-block probe per contract.
    pub async fn stats(&self) -> Result<StatsReport, CommandError> {
        let ids: Vec<ContractId> = self.contracts.iter().map(|c| c.id.clone()).collect();
        let store = self.store.stats(&ids)?;

        let probes = self.contracts.iter().map(|contract| async move {
            match self.chain.latest_block(contract).await {
                Ok(block) => ChainStatus {
                    contract: contract.id.clone(),
                    latest_block: Some(block),
                    error: None,
                },
                Err(e) => ChainStatus {
                    contract: contract.id.clone(),
                    latest_block: None,
                    error: Some(e.to_string()),
                },
            }
        });
        let chains = join_all(probes).await;

        Ok(StatsReport {
            store,
            contract_names: self.contracts.iter().map(|c| c.name.clone()).collect(),
            cycles: self.scheduler.stats(),
            chains,
        })
    }

    fn linked(&self, identity: &IdentityId) -> Result<IdentityLink, CommandError> {
        match self.store.get_link(identity) {
            Ok(link) => Ok(link),
            Err(StoreError::NotFound(_)) => Err(CommandError::NotLinked(identity.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn select(&self, requested: Option<&str>) -> Result<Vec<&ContractDefinition>, CommandError> {
        let Some(requested) = requested else {
            return Ok(self.contracts.iter().collect());
        };
        match self.contracts.iter().find(|c| c.is_selected_by(requested)) {
            Some(contract) => Ok(vec![contract]),
            None => Err(CommandError::UnknownContract {
                requested: requested.to_string(),
                available: self
                    .contracts
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}
