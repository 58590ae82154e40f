use proptest::prelude::*;

use chaingate_types::{ContractId, Timestamp, TxHash, WalletAddress};

proptest! {
    /// Any 40-hex-digit body parses, and the stored form is lowercase.
    #[test]
    fn address_normalizes_to_lowercase(body in "[0-9a-fA-F]{40}") {
        let addr = WalletAddress::parse(&format!("0x{}", body)).unwrap();
        prop_assert_eq!(addr.as_str(), format!("0x{}", body.to_ascii_lowercase()));
    }

    /// Two spellings differing only in case yield equal addresses.
    #[test]
    fn address_case_insensitive_equality(body in "[0-9a-f]{40}") {
        let lower = WalletAddress::parse(&format!("0x{}", body)).unwrap();
        let upper = WalletAddress::parse(&format!("0x{}", body.to_ascii_uppercase())).unwrap();
        prop_assert_eq!(lower, upper);
    }

    /// Bodies of the wrong length never parse.
    #[test]
    fn address_wrong_length_rejected(body in "[0-9a-f]{0,39}") {
        let input = format!("0x{}", body);
        prop_assert!(WalletAddress::parse(&input).is_err());
    }

    /// The serde string form survives bincode, as the LMDB store encodes it.
    #[test]
    fn address_bincode_roundtrip(body in "[0-9a-f]{40}") {
        let addr = WalletAddress::parse(&format!("0x{}", body)).unwrap();
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: WalletAddress = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// TxHash parsing is case-insensitive.
    #[test]
    fn tx_hash_case_insensitive(body in "[0-9a-f]{64}") {
        let a = TxHash::parse(&format!("0x{}", body)).unwrap();
        let b = TxHash::parse(&format!("0x{}", body.to_ascii_uppercase())).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
    }

    /// Non-blank identifiers are accepted verbatim.
    #[test]
    fn contract_id_accepts_non_blank(raw in "[a-z][a-z0-9_]{0,15}") {
        let id = ContractId::new(raw.clone()).unwrap();
        prop_assert_eq!(id.as_str(), raw.as_str());
    }
}

#[test]
fn malformed_address_fails_deserialization() {
    let encoded = bincode::serialize(&"0x1234".to_string()).unwrap();
    let decoded: Result<WalletAddress, _> = bincode::deserialize(&encoded);
    assert!(decoded.is_err());
}
