//! Credential registry domain.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → service.rs (validate, derive ID, one contract call/transaction)
//!     → blockchain::ChainAdapter
//!     → types.rs (contract tuples → named records)
//! ```

pub mod id;
pub mod service;
pub mod types;

pub use id::{derive_credential_id, Clock, FixedClock, SystemClock};
pub use service::{CredentialService, GatewayError, GatewayResult};
pub use types::{
    Credential, IssuedCredential, IssuedReceipt, Listing, NewCredential, ReceivedCredential,
    Verification,
};
