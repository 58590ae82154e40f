//! Platform-neutral message payloads.

use serde::Serialize;

use chaingate_types::{IdentityId, TxHash};

/// A titled message with optional name/value fields, rendered by the sink
/// as whatever rich format the platform supports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
}

impl Notification {
    /// Direct message telling a member a contract verified them.
    pub fn verified_dm(contract_name: &str, tx_hash: &TxHash) -> Self {
        Self {
            title: "✅ Verification Complete".to_string(),
            description: format!(
                "Your interaction with **{contract_name}** was confirmed on-chain and your role has been assigned."
            ),
            fields: vec![("Transaction".to_string(), format!("`{}`", tx_hash.short()))],
        }
    }

    /// Channel announcement for one member's new verifications.
    pub fn announcement(identity: &IdentityId, contract_names: &[String]) -> Self {
        Self {
            title: "🎉 New Verification!".to_string(),
            description: format!("<@{identity}> has been verified!"),
            fields: vec![(
                "Contracts".to_string(),
                contract_names
                    .iter()
                    .map(|n| format!("✅ {n}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcement_lists_every_contract() {
        let identity = IdentityId::new("1234").unwrap();
        let n = Notification::announcement(&identity, &["Alpha".into(), "Beta".into()]);
        assert_eq!(n.description, "<@1234> has been verified!");
        assert_eq!(n.fields[0].1, "✅ Alpha\n✅ Beta");
    }

    #[test]
    fn dm_shows_short_hash() {
        let tx = TxHash::parse(&format!("0x{}", "ab".repeat(32))).unwrap();
        let n = Notification::verified_dm("Alpha", &tx);
        assert!(n.description.contains("**Alpha**"));
        assert_eq!(n.fields[0].1, format!("`{}`", tx.short()));
    }
}
