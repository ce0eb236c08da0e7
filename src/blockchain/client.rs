//! Blockchain RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint (plus optional failovers)
//! - Query chain state (chain id, block number, nonce, gas price, receipts)
//! - Execute read-only calls and broadcast signed transactions
//! - Handle timeouts and network errors without panicking
//!
//! Everything above this module talks to the chain through [`ChainRpc`], so
//! the transaction manager and the contract adapter can be driven by an
//! in-process fake in tests.

use std::future::Future;
use std::time::{Duration, Instant};

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::blockchain::types::{ChainError, ChainId, ChainResult, ReceiptStatus};
use crate::observability::metrics;

/// The subset of JSON-RPC the gateway needs.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> ChainResult<ChainId>;

    /// `eth_blockNumber`.
    async fn block_number(&self) -> ChainResult<u64>;

    /// `eth_call` against `to` with ABI-encoded `data`.
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes>;

    /// `eth_getTransactionCount` at the pending block tag.
    async fn transaction_count(&self, address: Address) -> ChainResult<u64>;

    /// `eth_gasPrice` in wei.
    async fn gas_price(&self) -> ChainResult<u128>;

    /// `eth_sendRawTransaction` with an EIP-2718 encoded, signed transaction.
    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash>;

    /// `eth_getTransactionReceipt`. `None` while the transaction is pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<ReceiptStatus>>;
}

/// JSON-RPC client over HTTP with failover support.
#[derive(Clone)]
pub struct RpcClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Primary endpoint, kept for logs.
    rpc_url: String,
    /// Request timeout per provider attempt.
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a client for `rpc_url` and any `failover_urls`.
    ///
    /// No network traffic happens here; an unreachable node only surfaces on
    /// the first request.
    pub fn new(rpc_url: &str, failover_urls: &[String], rpc_timeout_secs: u64) -> ChainResult<Self> {
        let mut providers = Vec::with_capacity(1 + failover_urls.len());

        let primary_url: url::Url = rpc_url
            .parse()
            .map_err(|e| ChainError::Connection(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        providers.push(ProviderBuilder::new().connect_http(primary_url).erased());

        for url_str in failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(ProviderBuilder::new().connect_http(url).erased()),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        Ok(Self {
            providers,
            rpc_url: rpc_url.to_string(),
            timeout_duration: Duration::from_secs(rpc_timeout_secs),
        })
    }

    /// Run `op` against each provider in turn until one answers.
    ///
    /// A JSON-RPC error response (e.g. a revert or "nonce too low") is the
    /// node's verdict and is returned immediately. Transport failures and
    /// timeouts move on to the next provider.
    async fn with_failover<T, F, Fut>(&self, method: &'static str, op: F) -> ChainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let started = Instant::now();
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => {
                    metrics::record_rpc_call(method, true, started.elapsed());
                    return Ok(result);
                }
                Ok(Err(e)) if e.is_error_resp() => {
                    metrics::record_rpc_call(method, false, started.elapsed());
                    return Err(ChainError::Rpc(e.to_string()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                }
            }
            metrics::record_rpc_failover(method);
        }
        metrics::record_rpc_call(method, false, started.elapsed());
        Err(ChainError::Connection(format!(
            "All RPC providers failed for {}",
            method
        )))
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn chain_id(&self) -> ChainResult<ChainId> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.with_failover("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.with_failover("eth_call", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    async fn transaction_count(&self, address: Address) -> ChainResult<u64> {
        self.with_failover("eth_getTransactionCount", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.with_failover("eth_gasPrice", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash> {
        self.with_failover("eth_sendRawTransaction", |p| {
            let raw = raw.clone();
            async move {
                let pending = p.send_raw_transaction(&raw).await?;
                Ok(*pending.tx_hash())
            }
        })
        .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<ReceiptStatus>> {
        let receipt = self
            .with_failover("eth_getTransactionReceipt", |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.map(|r| ReceiptStatus {
            block_number: r.block_number,
            success: r.status(),
        }))
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_primary_url() {
        let result = RpcClient::new("not a url", &[], 5);
        assert!(matches!(result, Err(ChainError::Connection(_))));
    }

    #[test]
    fn test_invalid_failover_ignored() {
        let client = RpcClient::new(
            "http://127.0.0.1:8545",
            &["::bad::".to_string(), "http://127.0.0.1:8546".to_string()],
            5,
        )
        .unwrap();
        assert_eq!(client.providers.len(), 2);
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausted() {
        // Nothing listens on port 9; both attempts fail at the transport level.
        let client = RpcClient::new(
            "http://127.0.0.1:9",
            &["http://127.0.0.1:9".to_string()],
            2,
        )
        .unwrap();

        let result = client.chain_id().await;
        match result {
            Err(ChainError::Connection(msg)) => assert!(msg.contains("All RPC providers failed")),
            other => panic!("expected connection error, got {:?}", other.map(|c| c.0)),
        }
    }
}
