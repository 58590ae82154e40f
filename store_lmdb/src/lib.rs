//! LMDB storage backend for chaingate.
//!
//! Implements the storage traits from `chaingate-store` using the `heed`
//! LMDB bindings. Each logical store maps to one or more LMDB databases
//! within a single environment. LMDB allows one writer at a time, so every
//! read-modify-write performed inside a single write transaction is an
//! atomic check-and-set across threads.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod link;
pub mod meta;
pub mod migration;
pub mod store;
pub mod verification;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use link::LmdbLinkStore;
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use store::LmdbStore;
pub use verification::LmdbVerificationStore;
