//! LMDB implementation of LinkStore.
//!
//! A link is written to three databases in one write transaction: the
//! link itself keyed by identity, the reverse wallet index, and the
//! insertion-order index keyed by a big-endian sequence number.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use chaingate_store::{LinkStore, StoreError};
use chaingate_types::{IdentityId, IdentityLink, Timestamp, WalletAddress};

use crate::keys::sequence_key;
use crate::LmdbError;

/// Meta key holding the last assigned link sequence number.
pub(crate) const LINK_SEQUENCE_KEY: &[u8] = b"link_sequence";

pub struct LmdbLinkStore {
    pub(crate) env: Arc<Env>,
    pub(crate) links_db: Database<Bytes, Bytes>,
    pub(crate) wallet_index_db: Database<Bytes, Bytes>,
    pub(crate) link_order_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn decode_sequence(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        LmdbError::Serialization("link_sequence has unexpected byte length".to_string())
    })?;
    Ok(u64::from_le_bytes(arr))
}

impl LmdbLinkStore {
    fn read_link(&self, rtxn: &heed::RoTxn, identity: &[u8]) -> Result<Option<IdentityLink>, LmdbError> {
        match self.links_db.get(rtxn, identity)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}

impl LinkStore for LmdbLinkStore {
    fn link_wallet(
        &self,
        identity: &IdentityId,
        wallet: &WalletAddress,
        linked_at: Timestamp,
    ) -> Result<IdentityLink, StoreError> {
        let identity_key = identity.as_str().as_bytes();
        let wallet_key = wallet.as_str().as_bytes();

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .links_db
            .get(&wtxn, identity_key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(LmdbError::Duplicate(format!("identity {identity} already linked")).into());
        }
        if self
            .wallet_index_db
            .get(&wtxn, wallet_key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(LmdbError::Duplicate(format!("wallet {wallet} already linked")).into());
        }

        let previous = match self
            .meta_db
            .get(&wtxn, LINK_SEQUENCE_KEY)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode_sequence(bytes)?,
            None => 0,
        };
        let sequence = previous + 1;

        let link = IdentityLink {
            identity: identity.clone(),
            wallet: wallet.clone(),
            linked_at,
            sequence,
        };
        let bytes = bincode::serialize(&link).map_err(LmdbError::from)?;

        self.links_db
            .put(&mut wtxn, identity_key, &bytes)
            .map_err(LmdbError::from)?;
        self.wallet_index_db
            .put(&mut wtxn, wallet_key, identity_key)
            .map_err(LmdbError::from)?;
        self.link_order_db
            .put(&mut wtxn, &sequence_key(sequence), identity_key)
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, LINK_SEQUENCE_KEY, &sequence.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(link)
    }

    fn get_link(&self, identity: &IdentityId) -> Result<IdentityLink, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.read_link(&rtxn, identity.as_str().as_bytes())?
            .ok_or_else(|| StoreError::NotFound(format!("link for identity {identity}")))
    }

    fn get_link_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<IdentityLink>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let identity = match self
            .wallet_index_db
            .get(&rtxn, wallet.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(identity) => identity,
            None => return Ok(None),
        };
        let link = self.read_link(&rtxn, identity)?.ok_or_else(|| {
            StoreError::Corruption(format!("wallet index for {wallet} points at a missing link"))
        })?;
        Ok(Some(link))
    }

    fn link_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.links_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    fn iter_links(&self) -> Result<Vec<IdentityLink>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.link_order_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut links = Vec::new();
        for entry in iter {
            let (_seq, identity) = entry.map_err(LmdbError::from)?;
            let link = self.read_link(&rtxn, identity)?.ok_or_else(|| {
                StoreError::Corruption("link order index points at a missing link".to_string())
            })?;
            links.push(link);
        }
        Ok(links)
    }
}
