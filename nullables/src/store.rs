//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chaingate_store::{EngineStore, LinkStore, RecordOutcome, StoreError, VerificationStore};
use chaingate_types::{
    ContractId, IdentityId, IdentityLink, Timestamp, TxHash, VerificationRecord, WalletAddress,
};

#[derive(Default)]
struct Inner {
    /// Links in insertion order.
    links: Vec<IdentityLink>,
    /// (wallet, contract) -> record
    records: HashMap<(String, String), VerificationRecord>,
}

/// An in-memory [`EngineStore`].
///
/// Check-and-set happens under a single mutex, matching the single-writer
/// transaction of the LMDB backend.
#[derive(Default)]
pub struct NullStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
    record_calls: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `record_verification` fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `record_verification` calls, successful or not.
    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    /// Seed a verified record directly, bypassing the write path.
    pub fn insert_verified(&self, wallet: &WalletAddress, record: VerificationRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .records
            .insert((wallet.to_string(), record.contract.to_string()), record);
    }
}

impl LinkStore for NullStore {
    fn link_wallet(
        &self,
        identity: &IdentityId,
        wallet: &WalletAddress,
        linked_at: Timestamp,
    ) -> Result<IdentityLink, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.links.iter().any(|l| &l.identity == identity) {
            return Err(StoreError::Duplicate(format!("identity {identity}")));
        }
        if inner.links.iter().any(|l| &l.wallet == wallet) {
            return Err(StoreError::Duplicate(format!("wallet {wallet}")));
        }
        let link = IdentityLink {
            identity: identity.clone(),
            wallet: wallet.clone(),
            linked_at,
            sequence: inner.links.len() as u64,
        };
        inner.links.push(link.clone());
        Ok(link)
    }

    fn get_link(&self, identity: &IdentityId) -> Result<IdentityLink, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .links
            .iter()
            .find(|l| &l.identity == identity)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("identity {identity}")))
    }

    fn get_link_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<IdentityLink>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .links
            .iter()
            .find(|l| &l.wallet == wallet)
            .cloned())
    }

    fn link_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().links.len() as u64)
    }

    fn iter_links(&self) -> Result<Vec<IdentityLink>, StoreError> {
        Ok(self.inner.lock().unwrap().links.clone())
    }
}

impl VerificationStore for NullStore {
    fn is_verified(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .records
            .get(&(wallet.to_string(), contract.to_string()))
            .is_some_and(|r| r.verified))
    }

    fn get_record(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .records
            .get(&(wallet.to_string(), contract.to_string()))
            .cloned())
    }

    fn records_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<VerificationRecord> = inner
            .records
            .iter()
            .filter(|((w, _), _)| w == wallet.as_str())
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by(|a, b| a.contract.as_str().cmp(b.contract.as_str()));
        Ok(records)
    }

    fn record_verification(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
        tx_hash: &TxHash,
        block_number: u64,
        confirmed_at: Timestamp,
    ) -> Result<RecordOutcome, StoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write failure injected".into()));
        }
        let mut inner = self.inner.lock().unwrap();
        let key = (wallet.to_string(), contract.to_string());
        if inner.records.get(&key).is_some_and(|r| r.verified) {
            return Ok(RecordOutcome::AlreadyVerified);
        }
        inner.records.insert(
            key,
            VerificationRecord {
                contract: contract.clone(),
                verified: true,
                tx_hash: tx_hash.clone(),
                block_number,
                confirmed_at,
            },
        );
        Ok(RecordOutcome::Recorded)
    }
}

impl EngineStore for NullStore {}
