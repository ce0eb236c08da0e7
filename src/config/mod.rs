//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (--config / GATEWAY_CONFIG)
//!     → environment variables (always win)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared by value/Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so a deployment only sets what it needs
//! - Secrets (the signer key) are never serialized or printed

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, BlockchainConfig, ContractConfig, FrontendConfig, GatewayConfig, LogFormat,
    ObservabilityConfig, TransactionConfig,
};
