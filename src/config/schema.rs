//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the credential gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP API settings (bind address, timeouts, CORS).
    pub api: ApiConfig,

    /// Chain RPC connection and signer settings.
    pub blockchain: BlockchainConfig,

    /// Locations of the deployed contract artifacts.
    pub contract: ContractConfig,

    /// Transaction lifecycle tuning.
    pub transactions: TransactionConfig,

    /// Frontend used to build verification links.
    pub frontend: FrontendConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Request timeout in seconds. Must exceed the confirmation timeout so that
    /// transaction endpoints can report their own timeout.
    pub request_timeout_secs: u64,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl ApiConfig {
    /// The `host:port` pair to bind the listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 180,
            cors_origins: Vec::new(),
        }
    }
}

/// Blockchain connection configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for a local Hardhat node).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Hex-encoded signer key. Only ever read from the environment in production.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 0,
            rpc_timeout_secs: 10,
            private_key: None,
        }
    }
}

impl std::fmt::Debug for BlockchainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainConfig")
            .field("rpc_url", &self.rpc_url)
            .field("failover_urls", &self.failover_urls)
            .field("chain_id", &self.chain_id)
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Paths to the contract artifacts written by the deployment script.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Deployment record holding the contract address.
    pub address_file: String,

    /// Contract interface (ABI) JSON.
    pub abi_file: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address_file: "contracts/contract-address.json".to_string(),
            abi_file: "contracts/contract-abi.json".to_string(),
        }
    }
}

/// Transaction lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Fixed gas limit attached to every transaction.
    pub gas_limit: u64,

    /// Optional ceiling on the network gas price, in gwei.
    pub max_gas_price_gwei: Option<u64>,

    /// How long to wait for a receipt before reporting a timeout.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Extra blocks to wait on top of the receipt block (0 = receipt is enough).
    pub confirmation_blocks: u32,

    /// Maximum number of transactions in flight at once.
    pub max_in_flight: usize,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            gas_limit: 2_000_000,
            max_gas_price_gwei: None,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 1000,
            confirmation_blocks: 0,
            max_in_flight: 16,
        }
    }
}

/// Frontend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Base URL of the verification frontend (no trailing slash required).
    pub base_url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "credential_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.api.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.transactions.gas_limit, 2_000_000);
        assert_eq!(config.blockchain.chain_id, 0);
        assert!(config.blockchain.private_key.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [api]
            port = 9001

            [transactions]
            confirmation_timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.api.port, 9001);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.transactions.confirmation_timeout_secs, 30);
        assert_eq!(config.transactions.poll_interval_ms, 1000);
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = BlockchainConfig {
            private_key: Some("deadbeef".to_string()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("deadbeef"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_private_key_not_serialized() {
        let mut config = GatewayConfig::default();
        config.blockchain.private_key = Some("deadbeef".to_string());
        let out = toml::to_string(&config).unwrap();
        assert!(!out.contains("deadbeef"));
    }

    #[test]
    fn test_log_format_parse() {
        let config: ObservabilityConfig = toml::from_str("log_format = \"json\"").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
