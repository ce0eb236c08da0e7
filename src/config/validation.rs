//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. Every problem is
//! collected so operators see the full list in one pass.

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "blockchain.rpc_url", &config.blockchain.rpc_url);
    for url in &config.blockchain.failover_urls {
        check_url(&mut errors, "blockchain.failover_urls", url);
    }
    if config.blockchain.chain_id == 0 {
        errors.push(ValidationError::new("blockchain.chain_id", "must be set (CHAIN_ID)"));
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be > 0"));
    }
    match config.blockchain.private_key.as_deref() {
        None | Some("") => {
            errors.push(ValidationError::new("blockchain.private_key", "must be set (PRIVATE_KEY)"))
        }
        Some(_) => {}
    }

    check_url(&mut errors, "frontend.base_url", &config.frontend.base_url);

    if config.api.port == 0 {
        errors.push(ValidationError::new("api.port", "must be > 0"));
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be > 0"));
    }

    let tx = &config.transactions;
    if tx.gas_limit == 0 {
        errors.push(ValidationError::new("transactions.gas_limit", "must be > 0"));
    }
    if tx.max_in_flight == 0 {
        errors.push(ValidationError::new("transactions.max_in_flight", "must be > 0"));
    }
    if tx.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transactions.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    if tx.poll_interval_ms == 0 || tx.poll_interval_ms >= tx.confirmation_timeout_secs * 1000 {
        errors.push(ValidationError::new(
            "transactions.poll_interval_ms",
            "must be > 0 and shorter than the confirmation timeout",
        ));
    }
    if config.api.request_timeout_secs <= tx.confirmation_timeout_secs {
        errors.push(ValidationError::new(
            "api.request_timeout_secs",
            "must exceed transactions.confirmation_timeout_secs",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::new(field, "must be set"));
        return;
    }
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}
