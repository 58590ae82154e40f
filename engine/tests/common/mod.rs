#![allow(dead_code)]

use std::sync::Arc;

use chaingate_engine::{Engine, EngineConfig};
use chaingate_nullables::{NullChain, NullSink, NullStore};
use chaingate_store::LinkStore;
use chaingate_types::{
    ChannelId, ContractDefinition, ContractId, IdentityId, RoleId, Timestamp, TxHash,
    WalletAddress,
};

pub const ANNOUNCE_CHANNEL: &str = "announcements";

pub fn wallet(n: u64) -> WalletAddress {
    WalletAddress::parse(&format!("0x{n:040x}")).unwrap()
}

pub fn identity(n: u64) -> IdentityId {
    IdentityId::new(format!("user{n}")).unwrap()
}

pub fn tx(n: u64) -> TxHash {
    TxHash::parse(&format!("0x{n:064x}")).unwrap()
}

pub fn cid(id: &str) -> ContractId {
    ContractId::new(id).unwrap()
}

pub fn role(id: &str) -> RoleId {
    RoleId::new(id).unwrap()
}

pub fn contract(id: &str, role_id: &str) -> ContractDefinition {
    ContractDefinition {
        id: cid(id),
        name: format!("Contract {}", id.to_uppercase()),
        address: WalletAddress::parse("0xcccccccccccccccccccccccccccccccccccccccc").unwrap(),
        role_id: role(role_id),
        rpc_url: format!("http://rpc-{id}.invalid"),
        verification_channel_id: None,
        min_confirmations: None,
    }
}

/// Two contracts A → R1 and B → R2, threshold 1, no inter-wallet delay.
pub fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.contracts = vec![contract("a", "R1"), contract("b", "R2")];
    config.scheduler.chunk_delay_ms = 0;
    config.scheduler.interval_secs = 1;
    config.chain.query_timeout_secs = 5;
    config.sink.token = "test-token".into();
    config.sink.guild_id = "guild".into();
    config.sink.verification_channel_id = Some(ChannelId::new(ANNOUNCE_CHANNEL).unwrap());
    config
}

pub struct Harness {
    pub store: Arc<NullStore>,
    pub chain: Arc<NullChain>,
    pub sink: Arc<NullSink>,
    pub engine: Engine,
}

impl Harness {
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(NullStore::new());
        let chain = Arc::new(NullChain::new());
        let sink = Arc::new(NullSink::new());
        let engine =
            Engine::with_parts(config, store.clone(), chain.clone(), sink.clone()).unwrap();
        Self {
            store,
            chain,
            sink,
            engine,
        }
    }

    /// Link `user{n}` to `wallet(n)`.
    pub fn link(&self, n: u64) -> (IdentityId, WalletAddress) {
        self.store
            .link_wallet(&identity(n), &wallet(n), Timestamp::new(n))
            .unwrap();
        (identity(n), wallet(n))
    }
}
