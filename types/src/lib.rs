//! Fundamental types for chaingate.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! wallet addresses, identity and contract identifiers, transaction hashes,
//! timestamps, contract definitions and the persisted link/verification records.

pub mod address;
pub mod contract;
pub mod error;
pub mod hash;
pub mod ids;
pub mod record;
pub mod time;

pub use address::WalletAddress;
pub use contract::ContractDefinition;
pub use error::TypesError;
pub use hash::TxHash;
pub use ids::{ChannelId, ContractId, IdentityId, RoleId};
pub use record::{IdentityLink, VerificationRecord};
pub use time::Timestamp;
