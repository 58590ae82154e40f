//! HTTP JSON-RPC client implementing the Chain Query Port for EVM chains.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use chaingate_types::{ContractDefinition, TxHash, WalletAddress};

use crate::port::{ChainAnswer, ChainQueryPort};
use crate::rpc::{
    candidates, parse_quantity, quantity, RpcBlock, RpcReceipt, RpcRequest, RpcResponse,
};
use crate::ChainError;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Search and transport settings shared by every contract's endpoint.
#[derive(Clone, Debug)]
pub struct EvmRpcConfig {
    /// Search window `W`: how many blocks back from the head to scan.
    pub search_blocks: u64,
    /// Blocks fetched per batched HTTP request.
    pub block_batch: usize,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
}

impl Default for EvmRpcConfig {
    fn default() -> Self {
        Self {
            search_blocks: 10_000,
            block_batch: 25,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Client for EVM JSON-RPC endpoints.
///
/// One `reqwest::Client` (one connection pool) serves all endpoints; the
/// endpoint URL comes from the contract being queried.
pub struct EvmRpcClient {
    http: reqwest::Client,
    config: EvmRpcConfig,
}

impl EvmRpcClient {
    pub fn new(config: EvmRpcConfig) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::RequestFailed(format!("building HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &EvmRpcConfig {
        &self.config
    }

    async fn call(
        &self,
        url: &str,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let request = RpcRequest::new(1, method, params);
        let response = self.http.post(url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(ChainError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        let body: RpcResponse = response.json().await?;
        body.into_result()
    }

    /// Send several requests as one JSON-RPC batch; responses come back in
    /// request order regardless of how the node ordered them.
    async fn call_batch(
        &self,
        url: &str,
        requests: &[RpcRequest],
    ) -> Result<Vec<serde_json::Value>, ChainError> {
        let response = self.http.post(url).json(requests).send().await?;
        if !response.status().is_success() {
            return Err(ChainError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        let mut bodies: Vec<RpcResponse> = response.json().await?;
        if bodies.len() != requests.len() {
            return Err(ChainError::InvalidResponse(format!(
                "batch of {} requests answered with {} responses",
                requests.len(),
                bodies.len()
            )));
        }
        bodies.sort_by_key(|b| b.id.unwrap_or(u64::MAX));
        bodies.into_iter().map(RpcResponse::into_result).collect()
    }

    async fn fetch_blocks(&self, url: &str, numbers: &[u64]) -> Result<Vec<RpcBlock>, ChainError> {
        let requests: Vec<RpcRequest> = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| {
                RpcRequest::new(i as u64, "eth_getBlockByNumber", json!([quantity(*n), true]))
            })
            .collect();
        let mut blocks = Vec::with_capacity(numbers.len());
        for value in self.call_batch(url, &requests).await? {
            // A pruned or not-yet-propagated block comes back as null.
            if value.is_null() {
                continue;
            }
            let block: RpcBlock = serde_json::from_value(value)
                .map_err(|e| ChainError::InvalidResponse(format!("bad block: {e}")))?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    async fn receipt_succeeded(&self, url: &str, tx_hash: &TxHash) -> Result<bool, ChainError> {
        let value = self
            .call(url, "eth_getTransactionReceipt", json!([tx_hash.as_str()]))
            .await?;
        if value.is_null() {
            return Ok(false);
        }
        let receipt: RpcReceipt = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("bad receipt: {e}")))?;
        Ok(receipt.succeeded())
    }
}

#[async_trait]
impl ChainQueryPort for EvmRpcClient {
    async fn query(
        &self,
        wallet: &WalletAddress,
        contract: &ContractDefinition,
    ) -> Result<ChainAnswer, ChainError> {
        let url = contract.rpc_url.as_str();
        let latest = self.latest_block(contract).await?;
        if self.config.search_blocks == 0 {
            return Ok(ChainAnswer::NotFound);
        }
        let lowest = latest.saturating_sub(self.config.search_blocks - 1);
        let batch = self.config.block_batch.max(1) as u64;

        let mut high = latest;
        loop {
            let low = high.saturating_sub(batch - 1).max(lowest);
            let numbers: Vec<u64> = (low..=high).rev().collect();
            let blocks = self.fetch_blocks(url, &numbers).await?;

            for candidate in candidates(&blocks, wallet, &contract.address)? {
                if self.receipt_succeeded(url, &candidate.tx_hash).await? {
                    let confirmations = latest
                        .checked_sub(candidate.block_number)
                        .map(|depth| depth + 1)
                        .ok_or_else(|| {
                            ChainError::InvalidResponse(format!(
                                "block {} is above the reported head {latest}",
                                candidate.block_number
                            ))
                        })?;
                    tracing::debug!(
                        %wallet,
                        contract = %contract.id,
                        tx = %candidate.tx_hash,
                        block = candidate.block_number,
                        confirmations,
                        "qualifying transaction found"
                    );
                    return Ok(ChainAnswer::Found {
                        tx_hash: candidate.tx_hash,
                        block_number: candidate.block_number,
                        confirmations,
                    });
                }
                tracing::debug!(tx = %candidate.tx_hash, "skipping reverted transaction");
            }

            if low == lowest {
                break;
            }
            high = low - 1;
        }

        tracing::debug!(%wallet, contract = %contract.id, from = lowest, to = latest, "no qualifying transaction");
        Ok(ChainAnswer::NotFound)
    }

    async fn latest_block(&self, contract: &ContractDefinition) -> Result<u64, ChainError> {
        let value = self
            .call(&contract.rpc_url, "eth_blockNumber", json!([]))
            .await?;
        let raw = value
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse(format!("block number is not a string: {value}")))?;
        parse_quantity(raw)
    }
}
