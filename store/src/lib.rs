//! Abstract storage traits for chaingate.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The engine depends only on the traits, never on a backend.
//!
//! All operations must be safe to call from concurrent workers. In
//! particular [`VerificationStore::record_verification`] is a check-and-set:
//! two racing callers for the same `(wallet, contract)` pair observe exactly
//! one [`RecordOutcome::Recorded`].

pub mod engine_store;
pub mod error;
pub mod link;
pub mod meta;
pub mod verification;

pub use engine_store::{EngineStore, PendingWallet, StoreStats};
pub use error::StoreError;
pub use link::LinkStore;
pub use meta::MetaStore;
pub use verification::{RecordOutcome, VerificationStore};
