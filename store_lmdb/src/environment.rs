//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::link::LmdbLinkStore;
use crate::meta::LmdbMetaStore;
use crate::verification::LmdbVerificationStore;
use crate::LmdbError;

/// Named databases created in every chaingate environment.
pub const DATABASE_NAMES: &[&str] = &[
    "links",
    "wallet_index",
    "link_order",
    "verifications",
    "meta",
];

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    /// identity -> bincode(IdentityLink)
    pub(crate) links_db: Database<Bytes, Bytes>,
    /// wallet -> identity
    pub(crate) wallet_index_db: Database<Bytes, Bytes>,
    /// sequence (u64 BE) -> identity
    pub(crate) link_order_db: Database<Bytes, Bytes>,
    /// wallet ++ contract -> bincode(VerificationRecord)
    pub(crate) verifications_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path
        // and never memory-mapped by anything else while open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let links_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("links"))?;
        let wallet_index_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("wallet_index"))?;
        let link_order_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("link_order"))?;
        let verifications_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("verifications"))?;
        let meta_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "LMDB environment opened");

        Ok(Self {
            env: Arc::new(env),
            links_db,
            wallet_index_db,
            link_order_db,
            verifications_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn link_store(&self) -> LmdbLinkStore {
        LmdbLinkStore {
            env: Arc::clone(&self.env),
            links_db: self.links_db,
            wallet_index_db: self.wallet_index_db,
            link_order_db: self.link_order_db,
            meta_db: self.meta_db,
        }
    }

    pub fn verification_store(&self) -> LmdbVerificationStore {
        LmdbVerificationStore {
            env: Arc::clone(&self.env),
            verifications_db: self.verifications_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
