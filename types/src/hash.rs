//! Transaction hash as reported by the chain.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A `0x`-prefixed, 32-byte transaction hash kept in its hex form.
///
/// The engine never needs the raw bytes; it only stores and displays the
/// hash the chain returned, so the hex string is the canonical value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Number of hex characters after the prefix.
    pub const HEX_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let hex = raw
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidTxHash(raw.to_string()))?;
        if hex.len() != Self::HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypesError::InvalidTxHash(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading 20 characters followed by an ellipsis.
    pub fn short(&self) -> String {
        format!("{}...", &self.0[..20])
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", &self.0[..10])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TxHash {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TxHash> for String {
    fn from(hash: TxHash) -> String {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0xAB00000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn parse_lowercases() {
        let h = TxHash::parse(HASH).unwrap();
        assert!(h.as_str().starts_with("0xab00"));
        assert_eq!(h.as_str().len(), 66);
    }

    #[test]
    fn parse_rejects_short_or_unprefixed() {
        assert!(TxHash::parse("0x1234").is_err());
        assert!(TxHash::parse(&HASH[2..]).is_err());
    }

    #[test]
    fn short_is_prefix_with_ellipsis() {
        let h = TxHash::parse(HASH).unwrap();
        assert_eq!(h.short(), "0xab0000000000000000...");
    }
}
