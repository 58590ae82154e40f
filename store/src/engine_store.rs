//! Combined store view used by the verification engine.
//!
//! Pending selection and statistics are derived by scanning links and
//! records on every call; nothing here is cached, so results are never
//! stale relative to the last committed write.

use chaingate_types::{ContractId, IdentityId, WalletAddress};
use serde::Serialize;

use crate::{LinkStore, StoreError, VerificationStore};

/// A linked wallet with at least one configured contract not yet verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingWallet {
    pub identity: IdentityId,
    pub wallet: WalletAddress,
    /// Unverified contracts, in configured order.
    pub pending: Vec<ContractId>,
}

/// Aggregate verification counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_users: u64,
    /// Users with at least one verified contract.
    pub verified_users: u64,
    /// Users with at least one contract still pending.
    pub pending_users: u64,
    /// Users verified for every configured contract.
    pub fully_verified_users: u64,
    /// Verified count per configured contract, in configured order.
    pub per_contract: Vec<(ContractId, u64)>,
}

/// Everything the engine needs from storage, shareable across workers.
pub trait EngineStore: LinkStore + VerificationStore + Send + Sync {
    /// Up to `max_count` pending wallets, oldest-linked first.
    ///
    /// A wallet is pending if any contract in `contracts` lacks a verified
    /// record for it. The order is stable across calls.
    fn pending_wallets(
        &self,
        contracts: &[ContractId],
        max_count: usize,
    ) -> Result<Vec<PendingWallet>, StoreError> {
        let mut out = Vec::new();
        if max_count == 0 {
            return Ok(out);
        }
        for link in self.iter_links()? {
            let mut pending = Vec::new();
            for contract in contracts {
                if !self.is_verified(&link.wallet, contract)? {
                    pending.push(contract.clone());
                }
            }
            if !pending.is_empty() {
                out.push(PendingWallet {
                    identity: link.identity,
                    wallet: link.wallet,
                    pending,
                });
                if out.len() >= max_count {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Scan all links and records and aggregate counts for `contracts`.
    fn stats(&self, contracts: &[ContractId]) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats {
            per_contract: contracts.iter().map(|c| (c.clone(), 0)).collect(),
            ..Default::default()
        };
        for link in self.iter_links()? {
            stats.total_users += 1;
            let mut verified = 0usize;
            for (i, contract) in contracts.iter().enumerate() {
                if self.is_verified(&link.wallet, contract)? {
                    verified += 1;
                    stats.per_contract[i].1 += 1;
                }
            }
            if verified > 0 {
                stats.verified_users += 1;
            }
            if verified < contracts.len() {
                stats.pending_users += 1;
            } else {
                stats.fully_verified_users += 1;
            }
        }
        Ok(stats)
    }
}
