//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV_VAR: &str = "GATEWAY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file without applying the environment.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Build the runtime configuration: defaults, then the optional file, then
/// process environment variables. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let env_path = std::env::var(CONFIG_PATH_ENV_VAR).ok();
    let path = path.or(env_path.as_deref().map(Path::new));

    let mut config = match path {
        Some(p) => load_file(p)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` abstracts the environment so tests can supply their own values.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BLOCKCHAIN_RPC_URL") {
        config.blockchain.rpc_url = v;
    }
    if let Some(v) = lookup("CHAIN_ID") {
        config.blockchain.chain_id = v.trim().parse().map_err(|e| ConfigError::Env {
            var: "CHAIN_ID",
            message: format!("{}", e),
        })?;
    }
    if let Some(v) = lookup("PRIVATE_KEY") {
        config.blockchain.private_key = Some(v);
    }
    if let Some(v) = lookup("FRONTEND_URL") {
        config.frontend.base_url = v;
    }
    if let Some(v) = lookup("API_HOST") {
        config.api.host = v;
    }
    if let Some(v) = lookup("API_PORT") {
        config.api.port = v.trim().parse().map_err(|e| ConfigError::Env {
            var: "API_PORT",
            message: format!("{}", e),
        })?;
    }
    if let Some(v) = lookup("CONTRACT_ADDRESS_FILE") {
        config.contract.address_file = v;
    }
    if let Some(v) = lookup("CONTRACT_ABI_FILE") {
        config.contract.abi_file = v;
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    Ok(())
}
