//! Transaction lifecycle: build, sign, submit, confirm.
//!
//! # Responsibilities
//! - Assemble a legacy transaction with a fresh nonce, fixed gas limit and
//!   the current network gas price
//! - Sign with the configured wallet and broadcast
//! - Poll for the receipt within a bounded wait and interpret its status
//!
//! # Concurrency
//! Nonce fetch through submission runs under a per-sender async mutex so two
//! requests can never sign with the same nonce. A semaphore bounds how many
//! lifecycles (including their confirmation wait) run at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use dashmap::DashMap;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{ChainError, ChainResult, ReceiptStatus, TxState};
use crate::blockchain::wallet::Wallet;
use crate::config::TransactionConfig;
use crate::observability::metrics;

const GWEI: u128 = 1_000_000_000;

/// Drives state-changing contract invocations to a terminal state.
pub struct TxManager {
    rpc: Arc<dyn ChainRpc>,
    wallet: Option<Wallet>,
    config: TransactionConfig,
    sender_locks: DashMap<Address, Arc<Mutex<()>>>,
    in_flight: Semaphore,
}

impl TxManager {
    pub fn new(rpc: Arc<dyn ChainRpc>, wallet: Option<Wallet>, config: TransactionConfig) -> Self {
        let permits = config.max_in_flight.max(1);
        Self {
            rpc,
            wallet,
            config,
            sender_locks: DashMap::new(),
            in_flight: Semaphore::new(permits),
        }
    }

    /// Address transactions are sent from, if a signer is configured.
    pub fn sender(&self) -> Option<Address> {
        self.wallet.as_ref().map(Wallet::address)
    }

    /// Send `calldata` to `to` and wait for the outcome.
    ///
    /// `function` only labels logs and metrics. Returns the transaction hash
    /// when the receipt reports success.
    pub async fn send(&self, function: &str, to: Address, calldata: Vec<u8>) -> ChainResult<TxHash> {
        let wallet = self.wallet.as_ref().ok_or_else(|| {
            metrics::record_transaction(function, TxState::SignFailed);
            ChainError::Signing("Private key not configured".to_string())
        })?;

        let permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| ChainError::TransactionBuild("transaction manager closed".to_string()))?;
        metrics::set_transactions_in_flight(self.in_flight_count());

        let started = Instant::now();
        let result = self.run(function, wallet, to, calldata).await;
        metrics::record_transaction_duration(function, started.elapsed());

        drop(permit);
        metrics::set_transactions_in_flight(self.in_flight_count());
        result
    }

    fn in_flight_count(&self) -> usize {
        self.config.max_in_flight.max(1) - self.in_flight.available_permits()
    }

    async fn run(
        &self,
        function: &str,
        wallet: &Wallet,
        to: Address,
        calldata: Vec<u8>,
    ) -> ChainResult<TxHash> {
        let sender = wallet.address();
        let lock = self
            .sender_locks
            .entry(sender)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let tx_hash = {
            let _guard = lock.lock().await;

            let request = self
                .build(wallet, to, calldata)
                .await
                .inspect_err(|e| self.transition(function, None, TxState::BuildFailed, Some(e)))?;
            self.transition(function, None, TxState::Built, None);

            let envelope = wallet
                .sign(request)
                .await
                .inspect_err(|e| self.transition(function, None, TxState::SignFailed, Some(e)))?;
            let tx_hash = *envelope.tx_hash();
            self.transition(function, Some(tx_hash), TxState::Signed, None);

            let raw = Bytes::from(envelope.encoded_2718());
            self.rpc
                .send_raw_transaction(raw)
                .await
                .map_err(|e| match e {
                    ChainError::Connection(msg) | ChainError::Rpc(msg) => ChainError::Submit(msg),
                    other => other,
                })
                .inspect_err(|e| {
                    self.transition(function, Some(tx_hash), TxState::SubmitFailed, Some(e))
                })?;
            self.transition(function, Some(tx_hash), TxState::Submitted, None);
            tx_hash
        };

        match self.wait_for_receipt(tx_hash).await {
            Ok(status) if status.success => {
                self.transition(function, Some(tx_hash), TxState::MinedSuccess, None);
                Ok(tx_hash)
            }
            Ok(_) => {
                let err = ChainError::TransactionFailed { tx_hash };
                self.transition(function, Some(tx_hash), TxState::MinedFailure, Some(&err));
                Err(err)
            }
            Err(err) => {
                self.transition(function, Some(tx_hash), TxState::Timeout, Some(&err));
                Err(err)
            }
        }
    }

    /// Populate a legacy transaction request for `wallet`.
    async fn build(&self, wallet: &Wallet, to: Address, calldata: Vec<u8>) -> ChainResult<TransactionRequest> {
        let sender = wallet.address();

        let nonce = self
            .rpc
            .transaction_count(sender)
            .await
            .map_err(|e| ChainError::TransactionBuild(format!("nonce lookup failed: {}", e)))?;

        let gas_price = self
            .rpc
            .gas_price()
            .await
            .map_err(|e| ChainError::TransactionBuild(format!("gas price lookup failed: {}", e)))?;

        if let Some(max_gwei) = self.config.max_gas_price_gwei {
            let current_gwei = gas_price / GWEI;
            if current_gwei > u128::from(max_gwei) {
                return Err(ChainError::TransactionBuild(format!(
                    "gas price {} gwei exceeds maximum {} gwei",
                    current_gwei, max_gwei
                )));
            }
        }

        tracing::debug!(sender = %sender, nonce, gas_price, "Transaction fields fetched");

        Ok(TransactionRequest::default()
            .with_from(sender)
            .with_to(to)
            .with_input(calldata)
            .with_nonce(nonce)
            .with_gas_limit(self.config.gas_limit)
            .with_gas_price(gas_price)
            .with_chain_id(wallet.chain_id()))
    }

    /// Poll until a receipt appears or the confirmation timeout passes.
    ///
    /// RPC errors while polling are logged and retried on the next tick; only
    /// the deadline ends the wait without a receipt.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<ReceiptStatus> {
        let waited_secs = self.config.confirmation_timeout_secs;
        let required = u64::from(self.config.confirmation_blocks);
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms.max(1));

        let result = timeout(Duration::from_secs(waited_secs), async {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let receipt = match self.rpc.transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                        continue;
                    }
                };

                if !receipt.success || required == 0 {
                    return receipt;
                }

                let tx_block = match receipt.block_number {
                    Some(b) => b,
                    None => return receipt,
                };
                match self.rpc.block_number().await {
                    Ok(current) if current.saturating_sub(tx_block) >= required => return receipt,
                    Ok(current) => tracing::debug!(
                        tx_hash = %tx_hash,
                        confirmations = current.saturating_sub(tx_block),
                        required,
                        "Waiting for confirmations"
                    ),
                    Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed"),
                }
            }
        })
        .await;

        result.map_err(|_| ChainError::ConfirmationTimeout {
            tx_hash,
            waited_secs,
        })
    }

    fn transition(
        &self,
        function: &str,
        tx_hash: Option<TxHash>,
        state: TxState,
        error: Option<&ChainError>,
    ) {
        let hash = tx_hash.map(|h| h.to_string()).unwrap_or_default();
        match (state, error) {
            (TxState::MinedSuccess, _) => {
                tracing::info!(function, tx_hash = %hash, state = %state, "Transaction confirmed")
            }
            (_, Some(e)) => {
                tracing::warn!(function, tx_hash = %hash, state = %state, error = %e, "Transaction failed")
            }
            (_, None) => tracing::debug!(function, tx_hash = %hash, state = %state, "Transaction state"),
        }
        if state.is_terminal() {
            metrics::record_transaction(function, state);
        }
    }
}

impl std::fmt::Debug for TxManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxManager")
            .field("sender", &self.sender())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
