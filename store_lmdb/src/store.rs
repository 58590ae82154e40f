//! The combined LMDB store handed to the engine.

use std::path::Path;

use chaingate_store::{
    EngineStore, LinkStore, MetaStore, RecordOutcome, StoreError, VerificationStore,
};
use chaingate_types::{
    ContractId, IdentityId, IdentityLink, Timestamp, TxHash, VerificationRecord, WalletAddress,
};

use crate::environment::DATABASE_NAMES;
use crate::integrity::check_integrity;
use crate::{LmdbEnvironment, LmdbError, LmdbLinkStore, LmdbMetaStore, LmdbVerificationStore, Migrator};

/// Default LMDB map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;
/// Headroom over the databases chaingate creates.
const MAX_DBS: u32 = DATABASE_NAMES.len() as u32 + 4;

/// Links, verification records and metadata in one LMDB environment.
pub struct LmdbStore {
    environment: LmdbEnvironment,
    links: LmdbLinkStore,
    verifications: LmdbVerificationStore,
    meta: LmdbMetaStore,
}

impl LmdbStore {
    /// Open the store, migrate the schema and run an integrity check.
    ///
    /// Integrity problems are logged, not fatal: an absent database is
    /// recreated on open, and a read error will surface again on first use.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        let environment = LmdbEnvironment::open(path, MAX_DBS, map_size)?;
        let meta = environment.meta_store();
        Migrator::run(&meta)?;

        let report = check_integrity(environment.env())?;
        if report.is_healthy() {
            tracing::info!(
                databases = report.databases_checked,
                entries = report.total_entries,
                "store integrity check passed"
            );
        } else {
            for error in &report.errors {
                tracing::warn!(%error, "store integrity problem");
            }
        }

        Ok(Self {
            links: environment.link_store(),
            verifications: environment.verification_store(),
            meta,
            environment,
        })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.environment
    }

    pub fn meta_store(&self) -> &LmdbMetaStore {
        &self.meta
    }
}

impl LinkStore for LmdbStore {
    fn link_wallet(
        &self,
        identity: &IdentityId,
        wallet: &WalletAddress,
        linked_at: Timestamp,
    ) -> Result<IdentityLink, StoreError> {
        self.links.link_wallet(identity, wallet, linked_at)
    }

    fn get_link(&self, identity: &IdentityId) -> Result<IdentityLink, StoreError> {
        self.links.get_link(identity)
    }

    fn get_link_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<IdentityLink>, StoreError> {
        self.links.get_link_by_wallet(wallet)
    }

    fn link_count(&self) -> Result<u64, StoreError> {
        self.links.link_count()
    }

    fn iter_links(&self) -> Result<Vec<IdentityLink>, StoreError> {
        self.links.iter_links()
    }
}

impl VerificationStore for LmdbStore {
    fn is_verified(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<bool, StoreError> {
        self.verifications.is_verified(wallet, contract)
    }

    fn get_record(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        self.verifications.get_record(wallet, contract)
    }

    fn records_for_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        self.verifications.records_for_wallet(wallet)
    }

    fn record_verification(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
        tx_hash: &TxHash,
        block_number: u64,
        confirmed_at: Timestamp,
    ) -> Result<RecordOutcome, StoreError> {
        self.verifications
            .record_verification(wallet, contract, tx_hash, block_number, confirmed_at)
    }
}

impl EngineStore for LmdbStore {}

impl MetaStore for LmdbStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta.put_meta(key, value)
    }

    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.meta.get_meta(key)
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        self.meta.get_schema_version()
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.meta.set_schema_version(version)
    }
}
