//! Verification record storage trait.

use crate::StoreError;
use chaingate_types::{ContractId, Timestamp, TxHash, VerificationRecord, WalletAddress};

/// Result of an idempotent verification write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record was written; the caller owns the side effects.
    Recorded,
    /// A verified record already existed; nothing was written.
    AlreadyVerified,
}

/// Per-(wallet, contract) verification state.
///
/// `verified = true` is terminal: no call on this trait ever overwrites a
/// verified record.
pub trait VerificationStore {
    /// Cheap existence + flag check. Never consults the chain.
    fn is_verified(&self, wallet: &WalletAddress, contract: &ContractId)
        -> Result<bool, StoreError>;

    fn get_record(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// Every record stored for `wallet`, in contract-id order.
    fn records_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<VerificationRecord>, StoreError>;

    /// Mark `(wallet, contract)` verified unless it already is.
    ///
    /// Atomic check-and-set. On error nothing is persisted and the pair
    /// stays pending.
    fn record_verification(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
        tx_hash: &TxHash,
        block_number: u64,
        confirmed_at: Timestamp,
    ) -> Result<RecordOutcome, StoreError>;
}
