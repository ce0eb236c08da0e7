//! The single shared chain handle.
//!
//! Constructed once at startup and injected everywhere it is needed. Owns the
//! RPC connection, the bound contract (if its artifacts were found) and the
//! transaction manager (if a signer is configured).

use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, TxHash};

use crate::blockchain::client::{ChainRpc, RpcClient};
use crate::blockchain::contract::{ContractArtifacts, ContractHandle};
use crate::blockchain::transaction::TxManager;
use crate::blockchain::types::{ChainError, ChainResult};
use crate::blockchain::wallet::Wallet;
use crate::config::{BlockchainConfig, TransactionConfig};
use crate::observability::metrics;

pub struct ChainAdapter {
    rpc: Option<Arc<dyn ChainRpc>>,
    contract: Option<ContractHandle>,
    transactions: Option<TxManager>,
}

impl ChainAdapter {
    /// An adapter with no chain at all. Every contract operation fails with
    /// [`ChainError::ContractNotInitialized`].
    pub fn offline() -> Self {
        Self {
            rpc: None,
            contract: None,
            transactions: None,
        }
    }

    /// Connect to the endpoints in `config`.
    ///
    /// Only a malformed URL is an error. An unreachable node is logged and the
    /// adapter is returned anyway; `is_connected` reports the live state.
    pub async fn connect(config: &BlockchainConfig) -> ChainResult<Self> {
        let client = RpcClient::new(&config.rpc_url, &config.failover_urls, config.rpc_timeout_secs)?;
        tracing::info!(rpc_url = %config.rpc_url, chain_id = config.chain_id, "Blockchain client created");
        Ok(Self::with_rpc(Arc::new(client), config.chain_id).await)
    }

    /// Wrap an existing RPC implementation, checking it serves `expected_chain_id`.
    pub async fn with_rpc(rpc: Arc<dyn ChainRpc>, expected_chain_id: u64) -> Self {
        match rpc.chain_id().await {
            Ok(actual) if actual.0 == expected_chain_id => {
                tracing::info!(chain_id = actual.0, "Connected to chain");
            }
            Ok(actual) => {
                tracing::warn!(
                    expected = expected_chain_id,
                    actual = actual.0,
                    "Chain ID mismatch; transactions will be signed for the configured chain"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chain unreachable at startup, continuing in degraded mode");
            }
        }

        Self {
            rpc: Some(rpc),
            contract: None,
            transactions: None,
        }
    }

    /// Bind the registry contract from its deployment artifacts.
    ///
    /// Missing artifacts are not an error: the adapter simply stays unbound.
    pub fn bind_contract(&mut self, artifacts: ContractArtifacts) -> ChainResult<()> {
        match ContractHandle::from_artifacts(artifacts)? {
            Some(handle) => {
                tracing::info!(
                    address = %handle.address(),
                    network = handle.network().unwrap_or("unknown"),
                    "Contract bound"
                );
                self.contract = Some(handle);
            }
            None => {
                tracing::warn!("Contract artifacts not found; deploy the contract first");
            }
        }
        Ok(())
    }

    /// Enable state-changing calls signed by `wallet`.
    pub fn attach_signer(&mut self, wallet: Option<Wallet>, config: TransactionConfig) {
        if let Some(rpc) = &self.rpc {
            if wallet.is_none() {
                tracing::warn!("No signer configured; transactions will fail");
            }
            self.transactions = Some(TxManager::new(rpc.clone(), wallet, config));
        }
    }

    pub fn contract(&self) -> Option<&ContractHandle> {
        self.contract.as_ref()
    }

    /// Address transactions are signed by.
    pub fn signer_address(&self) -> Option<Address> {
        self.transactions.as_ref().and_then(TxManager::sender)
    }

    fn bound(&self) -> ChainResult<(&ContractHandle, &Arc<dyn ChainRpc>)> {
        match (&self.contract, &self.rpc) {
            (Some(contract), Some(rpc)) => Ok((contract, rpc)),
            _ => Err(ChainError::ContractNotInitialized),
        }
    }

    /// Read-only contract call. Returns the decoded outputs in ABI order.
    pub async fn call(&self, function: &str, args: &[DynSolValue]) -> ChainResult<Vec<DynSolValue>> {
        let (contract, rpc) = self.bound()?;
        let data = contract.encode(function, args)?;

        let output = rpc
            .call(contract.address(), Bytes::from(data))
            .await
            .map_err(|e| match e {
                ChainError::Rpc(msg) => ChainError::Call(format!("{}: {}", function, msg)),
                other => other,
            })?;

        contract.decode(function, &output)
    }

    /// State-changing contract call, driven to a mined receipt.
    pub async fn transact(&self, function: &str, args: &[DynSolValue]) -> ChainResult<TxHash> {
        let (contract, _) = self.bound()?;
        let data = contract.encode(function, args)?;
        let manager = self
            .transactions
            .as_ref()
            .ok_or_else(|| ChainError::Signing("Private key not configured".to_string()))?;
        manager.send(function, contract.address(), data).await
    }

    /// Liveness probe. Never errors; any failure is `false`.
    pub async fn is_connected(&self) -> bool {
        let connected = match &self.rpc {
            Some(rpc) => rpc.block_number().await.is_ok(),
            None => false,
        };
        metrics::set_chain_connected(connected);
        connected
    }
}

impl std::fmt::Debug for ChainAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAdapter")
            .field("rpc", &self.rpc.is_some())
            .field("contract", &self.contract.as_ref().map(ContractHandle::address))
            .field("signer", &self.signer_address())
            .finish()
    }
}
