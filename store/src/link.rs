//! Identity link storage trait.

use crate::StoreError;
use chaingate_types::{IdentityId, IdentityLink, Timestamp, WalletAddress};

/// Durable mapping from identity to the wallet it claimed.
pub trait LinkStore {
    /// Link `wallet` to `identity`.
    ///
    /// Fails with [`StoreError::Duplicate`] if the identity already has a
    /// wallet or the wallet is already claimed by another identity. Each new
    /// link receives the next insertion sequence number.
    fn link_wallet(
        &self,
        identity: &IdentityId,
        wallet: &WalletAddress,
        linked_at: Timestamp,
    ) -> Result<IdentityLink, StoreError>;

    /// Look up an identity's link; [`StoreError::NotFound`] if it has none.
    fn get_link(&self, identity: &IdentityId) -> Result<IdentityLink, StoreError>;

    /// Reverse lookup: which identity claimed `wallet`, if any.
    fn get_link_by_wallet(&self, wallet: &WalletAddress)
        -> Result<Option<IdentityLink>, StoreError>;

    fn link_count(&self) -> Result<u64, StoreError>;

    /// All links, oldest-linked first.
    fn iter_links(&self) -> Result<Vec<IdentityLink>, StoreError>;
}
