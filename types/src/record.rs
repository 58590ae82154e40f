//! Persisted identity links and verification records.

use serde::{Deserialize, Serialize};

use crate::{ContractId, IdentityId, Timestamp, TxHash, WalletAddress};

/// The link between an off-chain identity and the wallet it claimed.
///
/// The wallet is immutable once linked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    pub identity: IdentityId,
    pub wallet: WalletAddress,
    pub linked_at: Timestamp,
    /// Insertion sequence; orders pending selection oldest-linked first.
    pub sequence: u64,
}

/// Proof that a wallet satisfied one contract's on-chain condition.
///
/// Keyed by `(wallet, contract)`. Once `verified` is true the record is
/// never overwritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub contract: ContractId,
    pub verified: bool,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub confirmed_at: Timestamp,
}
