//! Chain-specific types and error definitions.

use alloy::primitives::TxHash;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC endpoint could not be reached.
    #[error("Chain unreachable: {0}")]
    Connection(String),

    /// Contract address or ABI artifact missing, so nothing can be called.
    #[error("Smart contract not initialized")]
    ContractNotInitialized,

    /// Contract artifact exists but could not be read or parsed.
    #[error("Contract artifact error: {0}")]
    Artifact(String),

    /// Read-only contract call failed or reverted.
    #[error("Contract call failed: {0}")]
    Call(String),

    /// Transaction could not be assembled (nonce, gas price, encoding).
    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    /// Signer missing or signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Node rejected the signed transaction.
    #[error("Transaction submission failed: {0}")]
    Submit(String),

    /// Transaction was mined with a failure status (revert or out of gas).
    #[error("Transaction {tx_hash} failed on chain (reverted or ran out of gas)")]
    TransactionFailed { tx_hash: TxHash },

    /// No receipt observed within the bounded wait. The transaction may still mine.
    #[error("Transaction {tx_hash} not confirmed after {waited_secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Malformed account address.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Raw RPC transport failure.
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// Hash of the transaction this error refers to, if it got that far.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            ChainError::TransactionFailed { tx_hash }
            | ChainError::ConfirmationTimeout { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Lifecycle state of a single transaction.
///
/// ```text
/// Built → Signed → Submitted → { MinedSuccess | MinedFailure }
/// any non-terminal → BuildFailed | SignFailed | SubmitFailed | Timeout
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Built,
    Signed,
    Submitted,
    MinedSuccess,
    MinedFailure,
    BuildFailed,
    SignFailed,
    SubmitFailed,
    Timeout,
}

impl TxState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxState::Built | TxState::Signed | TxState::Submitted)
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            TxState::Built => "built",
            TxState::Signed => "signed",
            TxState::Submitted => "submitted",
            TxState::MinedSuccess => "mined_success",
            TxState::MinedFailure => "mined_failure",
            TxState::BuildFailed => "build_failed",
            TxState::SignFailed => "sign_failed",
            TxState::SubmitFailed => "submit_failed",
            TxState::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a mined receipt says about a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptStatus {
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// `true` when the receipt status is 1.
    pub success: bool,
}
