//! Contract definitions loaded once at startup.

use serde::{Deserialize, Serialize};

use crate::{ChannelId, ContractId, RoleId, WalletAddress};

/// One configured on-chain contract and the platform role it unlocks.
///
/// Immutable after startup. The contract address is normalized the same way
/// as wallet addresses so transaction `to` fields compare directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub id: ContractId,
    /// Human-readable name shown in replies and announcements.
    pub name: String,
    pub address: WalletAddress,
    pub role_id: RoleId,
    /// JSON-RPC endpoint used to query this contract's chain.
    pub rpc_url: String,
    /// Announcement channel; falls back to the deployment default when unset.
    #[serde(default)]
    pub verification_channel_id: Option<ChannelId>,
    /// Per-contract confirmation threshold; falls back to the deployment default.
    #[serde(default)]
    pub min_confirmations: Option<u64>,
}

impl ContractDefinition {
    /// The confirmation threshold `C` that applies to this contract.
    pub fn effective_confirmations(&self, default: u64) -> u64 {
        self.min_confirmations.unwrap_or(default)
    }

    /// Whether `name_or_id` selects this contract (exact id or case-insensitive name).
    pub fn is_selected_by(&self, name_or_id: &str) -> bool {
        self.id.as_str() == name_or_id || self.name.eq_ignore_ascii_case(name_or_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> ContractDefinition {
        ContractDefinition {
            id: ContractId::new("contract1").unwrap(),
            name: "Contract 1".into(),
            address: WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap(),
            role_id: RoleId::new("900").unwrap(),
            rpc_url: "http://localhost:8545".into(),
            verification_channel_id: None,
            min_confirmations: None,
        }
    }

    #[test]
    fn threshold_falls_back_to_default() {
        let mut c = contract();
        assert_eq!(c.effective_confirmations(3), 3);
        c.min_confirmations = Some(12);
        assert_eq!(c.effective_confirmations(3), 12);
    }

    #[test]
    fn selected_by_id_or_name() {
        let c = contract();
        assert!(c.is_selected_by("contract1"));
        assert!(c.is_selected_by("contract 1"));
        assert!(!c.is_selected_by("contract2"));
    }
}
