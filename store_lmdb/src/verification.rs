//! LMDB implementation of VerificationStore.
//!
//! Records use composite keys `wallet_bytes ++ contract_bytes` so listing a
//! wallet's records is a prefix range-scan.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use chaingate_store::{RecordOutcome, StoreError, VerificationStore};
use chaingate_types::{ContractId, Timestamp, TxHash, VerificationRecord, WalletAddress};

use crate::keys::{increment_prefix, record_key};
use crate::LmdbError;

pub struct LmdbVerificationStore {
    pub(crate) env: Arc<Env>,
    pub(crate) verifications_db: Database<Bytes, Bytes>,
}

impl VerificationStore for LmdbVerificationStore {
    fn is_verified(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .get_record(wallet, contract)?
            .map(|r| r.verified)
            .unwrap_or(false))
    }

    fn get_record(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let key = record_key(wallet, contract);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let record = match self
            .verifications_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Some(bincode::deserialize(bytes).map_err(LmdbError::from)?),
            None => None,
        };
        Ok(record)
    }

    fn records_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let prefix = wallet.as_str().as_bytes();
        let mut upper = prefix.to_vec();
        increment_prefix(&mut upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds = (Bound::Included(prefix), Bound::Excluded(upper.as_slice()));
        let iter = self
            .verifications_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let record: VerificationRecord =
                bincode::deserialize(val).map_err(LmdbError::from)?;
            results.push(record);
        }
        Ok(results)
    }

    fn record_verification(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
        tx_hash: &TxHash,
        block_number: u64,
        confirmed_at: Timestamp,
    ) -> Result<RecordOutcome, StoreError> {
        let key = record_key(wallet, contract);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        // Read inside the write transaction: LMDB serializes writers, so
        // nothing can slip in between this check and the put below.
        let already_verified = match self
            .verifications_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let existing: VerificationRecord =
                    bincode::deserialize(bytes).map_err(LmdbError::from)?;
                existing.verified
            }
            None => false,
        };
        if already_verified {
            return Ok(RecordOutcome::AlreadyVerified);
        }

        let record = VerificationRecord {
            contract: contract.clone(),
            verified: true,
            tx_hash: tx_hash.clone(),
            block_number,
            confirmed_at,
        };
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.verifications_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(%wallet, %contract, block_number, "verification recorded");
        Ok(RecordOutcome::Recorded)
    }
}
