//! Ethereum JSON-RPC 2.0 wire types and block scanning.

use serde::{Deserialize, Serialize};

use chaingate_types::{TxHash, WalletAddress};

use crate::ChainError;

#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: &'static str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    /// Unwrap the `result`, turning a JSON-RPC error object into [`ChainError::Rpc`].
    pub fn into_result(self) -> Result<serde_json::Value, ChainError> {
        if let Some(err) = self.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(serde_json::Value::Null))
    }
}

/// Block as returned by `eth_getBlockByNumber(n, true)`, reduced to what
/// matching needs.
#[derive(Debug, Deserialize)]
pub struct RpcBlock {
    pub number: String,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creations.
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RpcReceipt {
    /// `0x1` success, `0x0` reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
}

impl RpcReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref().map(|s| s == "0x1").unwrap_or(true)
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> Result<u64, ChainError> {
    let hex = raw
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("quantity without 0x: {raw}")))?;
    u64::from_str_radix(hex, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("bad quantity {raw}: {e}")))
}

pub fn quantity(n: u64) -> String {
    format!("0x{:x}", n)
}

/// A transaction from `wallet` to `contract`, newest first.
#[derive(Debug, PartialEq, Eq)]
pub struct Candidate {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Collect every `wallet -> contract` transaction in `blocks`, most recent
/// first: blocks by descending number, transactions within a block by
/// descending index.
pub fn candidates(
    blocks: &[RpcBlock],
    wallet: &WalletAddress,
    contract: &WalletAddress,
) -> Result<Vec<Candidate>, ChainError> {
    let mut numbered = Vec::with_capacity(blocks.len());
    for block in blocks {
        numbered.push((parse_quantity(&block.number)?, block));
    }
    numbered.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = Vec::new();
    for (number, block) in numbered {
        for tx in block.transactions.iter().rev() {
            let to_contract = tx.to.as_deref().map(|to| contract.matches(to)).unwrap_or(false);
            if to_contract && wallet.matches(&tx.from) {
                let tx_hash = TxHash::parse(&tx.hash)
                    .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
                out.push(Candidate {
                    tx_hash,
                    block_number: number,
                });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const CONTRACT: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

    fn hash(n: u8) -> String {
        format!("0x{}", format!("{:02x}", n).repeat(32))
    }

    fn tx(n: u8, from: &str, to: Option<&str>) -> RpcTransaction {
        RpcTransaction {
            hash: hash(n),
            from: from.to_string(),
            to: to.map(str::to_string),
        }
    }

    #[test]
    fn parse_quantity_accepts_hex() {
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("1b4").is_err());
        assert!(parse_quantity("0xzz").is_err());
        assert_eq!(quantity(436), "0x1b4");
    }

    #[test]
    fn candidates_are_newest_first_and_case_insensitive() {
        let wallet = WalletAddress::parse(WALLET).unwrap();
        let contract = WalletAddress::parse(CONTRACT).unwrap();
        let upper_contract = CONTRACT.to_uppercase().replace("0X", "0x");
        let blocks = vec![
            RpcBlock {
                number: "0x10".into(),
                transactions: vec![tx(1, WALLET, Some(CONTRACT))],
            },
            RpcBlock {
                number: "0x12".into(),
                transactions: vec![
                    tx(2, WALLET, Some(&upper_contract)),
                    tx(3, "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", Some(CONTRACT)),
                    tx(4, WALLET, None),
                    tx(5, WALLET, Some(CONTRACT)),
                ],
            },
        ];
        let found = candidates(&blocks, &wallet, &contract).unwrap();
        let order: Vec<(u64, TxHash)> =
            found.into_iter().map(|c| (c.block_number, c.tx_hash)).collect();
        assert_eq!(
            order,
            vec![
                (0x12, TxHash::parse(&hash(5)).unwrap()),
                (0x12, TxHash::parse(&hash(2)).unwrap()),
                (0x10, TxHash::parse(&hash(1)).unwrap()),
            ]
        );
    }

    #[test]
    fn rpc_error_object_becomes_chain_error() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit exceeded"}}"#,
        )
        .unwrap();
        match resp.into_result() {
            Err(ChainError::Rpc { code, message }) => {
                assert_eq!(code, -32005);
                assert_eq!(message, "limit exceeded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn receipt_status() {
        assert!(RpcReceipt { status: Some("0x1".into()) }.succeeded());
        assert!(!RpcReceipt { status: Some("0x0".into()) }.succeeded());
        assert!(RpcReceipt { status: None }.succeeded());
    }
}
