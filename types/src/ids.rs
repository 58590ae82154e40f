//! String identifiers for identities, contracts, roles and channels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Build an identifier, rejecting empty strings.
            pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
                let s = raw.into();
                if s.trim().is_empty() {
                    return Err(TypesError::EmptyId { kind: $kind });
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypesError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

string_id!(
    /// Off-chain identity (a chat-platform user id).
    IdentityId,
    "identity id"
);
string_id!(
    /// Configured contract identifier, e.g. `contract1`.
    ContractId,
    "contract id"
);
string_id!(
    /// Platform role granted for a contract.
    RoleId,
    "role id"
);
string_id!(
    /// Platform channel used for announcements.
    ChannelId,
    "channel id"
);
