//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! contract-address.json + contract-abi.json
//!     → contract.rs (artifact loading, ABI encode/decode)
//! BLOCKCHAIN_RPC_URL
//!     → client.rs (JSON-RPC with timeouts and failover, behind ChainRpc)
//! PRIVATE_KEY
//!     → wallet.rs (signer)
//!     → transaction.rs (build, sign, broadcast, confirm)
//! all of the above
//!     → adapter.rs (one shared handle: call / transact / is_connected)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the chain or the contract is unavailable

pub mod adapter;
pub mod address;
pub mod client;
pub mod contract;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use adapter::ChainAdapter;
pub use address::normalize_address;
pub use client::{ChainRpc, RpcClient};
pub use contract::{ContractArtifacts, ContractHandle};
pub use transaction::TxManager;
pub use types::{ChainError, ChainId, ChainResult, ReceiptStatus, TxState};
pub use wallet::Wallet;
