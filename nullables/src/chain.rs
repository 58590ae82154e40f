//! Nullable chain: scripted answers and concurrency observation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use chaingate_chain::{ChainAnswer, ChainError, ChainQueryPort};
use chaingate_types::{ContractDefinition, ContractId, TxHash, WalletAddress};

enum Script {
    Answer(ChainAnswer),
    Fail(String),
}

/// A [`ChainQueryPort`] whose answers are set by the test.
///
/// Unscripted pairs answer [`ChainAnswer::NotFound`]. An optional delay
/// keeps queries in flight long enough to observe concurrency.
pub struct NullChain {
    scripts: Mutex<HashMap<(String, String), Script>>,
    down: Mutex<HashSet<String>>,
    latest: AtomicU64,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<(WalletAddress, ContractId)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight count even when the query future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            down: Mutex::new(HashSet::new()),
            latest: AtomicU64::new(1_000),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Script a qualifying transaction for `(wallet, contract)`.
    pub fn found(
        &self,
        wallet: &WalletAddress,
        contract: &ContractId,
        tx_hash: TxHash,
        block_number: u64,
        confirmations: u64,
    ) {
        self.script(
            wallet,
            contract,
            Script::Answer(ChainAnswer::Found {
                tx_hash,
                block_number,
                confirmations,
            }),
        );
    }

    /// Script an RPC failure for `(wallet, contract)`.
    pub fn fail(&self, wallet: &WalletAddress, contract: &ContractId, message: &str) {
        self.script(wallet, contract, Script::Fail(message.to_string()));
    }

    /// Make every call against `contract` fail as unreachable.
    pub fn take_down(&self, contract: &ContractId) {
        self.down.lock().unwrap().insert(contract.to_string());
    }

    pub fn set_latest_block(&self, block: u64) {
        self.latest.store(block, Ordering::SeqCst);
    }

    /// Delay applied to every query before it answers.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Every query received, in arrival order.
    pub fn calls(&self) -> Vec<(WalletAddress, ContractId)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, wallet: &WalletAddress, contract: &ContractId) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(w, c)| w == wallet && c == contract)
            .count()
    }

    /// Highest number of queries observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn script(&self, wallet: &WalletAddress, contract: &ContractId, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert((wallet.to_string(), contract.to_string()), script);
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainQueryPort for NullChain {
    async fn query(
        &self,
        wallet: &WalletAddress,
        contract: &ContractDefinition,
    ) -> Result<ChainAnswer, ChainError> {
        self.calls
            .lock()
            .unwrap()
            .push((wallet.clone(), contract.id.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.down.lock().unwrap().contains(contract.id.as_str()) {
            return Err(ChainError::Unreachable(format!("{} is down", contract.rpc_url)));
        }
        match self
            .scripts
            .lock()
            .unwrap()
            .get(&(wallet.to_string(), contract.id.to_string()))
        {
            Some(Script::Answer(answer)) => Ok(answer.clone()),
            Some(Script::Fail(message)) => Err(ChainError::RequestFailed(message.clone())),
            None => Ok(ChainAnswer::NotFound),
        }
    }

    async fn latest_block(&self, contract: &ContractDefinition) -> Result<u64, ChainError> {
        if self.down.lock().unwrap().contains(contract.id.as_str()) {
            return Err(ChainError::Unreachable(format!("{} is down", contract.rpc_url)));
        }
        Ok(self.latest.load(Ordering::SeqCst))
    }
}
