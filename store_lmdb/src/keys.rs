//! Binary key layouts shared by the LMDB stores.
//!
//! Normalized wallet addresses all have the same length (`0x` + 40 hex), so
//! a wallet prefix scan over composite keys never bleeds into a neighbour.

use chaingate_types::{ContractId, WalletAddress};

/// `wallet_bytes ++ contract_bytes`.
pub fn record_key(wallet: &WalletAddress, contract: &ContractId) -> Vec<u8> {
    let w = wallet.as_str().as_bytes();
    let c = contract.as_str().as_bytes();
    let mut key = Vec::with_capacity(w.len() + c.len());
    key.extend_from_slice(w);
    key.extend_from_slice(c);
    key
}

/// Big-endian sequence number, so LMDB's byte order is insertion order.
pub fn sequence_key(sequence: u64) -> [u8; 8] {
    sequence.to_be_bytes()
}

/// Turn `prefix` into the smallest key greater than every key it prefixes.
///
/// Used as the exclusive upper bound of a prefix range scan. An all-`0xff`
/// prefix becomes empty, which callers treat as "no upper bound".
pub fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.pop() {
        if last < u8::MAX {
            prefix.push(last + 1);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_simple() {
        let mut p = b"0xab".to_vec();
        increment_prefix(&mut p);
        assert_eq!(p, b"0xac".to_vec());
    }

    #[test]
    fn increment_carries_over_max_bytes() {
        let mut p = vec![0x01, 0xff, 0xff];
        increment_prefix(&mut p);
        assert_eq!(p, vec![0x02]);
    }

    #[test]
    fn sequence_keys_sort_numerically() {
        assert!(sequence_key(2) < sequence_key(10));
        assert!(sequence_key(255) < sequence_key(256));
    }

    #[test]
    fn record_key_starts_with_wallet() {
        let wallet = WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        let contract = ContractId::new("contract1").unwrap();
        let key = record_key(&wallet, &contract);
        assert!(key.starts_with(wallet.as_str().as_bytes()));
        assert!(key.ends_with(b"contract1"));
    }
}
