//! Credential Registry Gateway
//!
//! A REST gateway in front of a credential-registry smart contract.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                CREDENTIAL GATEWAY                │
//!                        │                                                  │
//!     Client Request     │  ┌─────────┐    ┌─────────────┐    ┌──────────┐  │
//!     ───────────────────┼─▶│  http   │───▶│ credentials │───▶│blockchain│──┼──▶ JSON-RPC
//!                        │  │ server  │    │   service   │    │ adapter  │  │    node
//!     Client Response    │  └────┬────┘    └─────────────┘    └────┬─────┘  │
//!     ◀──────────────────┼───────┘                                │        │
//!                        │       ▲                          ┌─────▼──────┐ │
//!                        │  ┌────┴─────────┐                │ tx manager │ │
//!                        │  │ presentation │                │ nonce/sign │ │
//!                        │  │   QR + PDF   │                │ /confirm   │ │
//!                        │  └──────────────┘                └────────────┘ │
//!                        │                                                  │
//!                        │  config · observability · lifecycle              │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use credential_gateway::blockchain::{ChainAdapter, ContractArtifacts, Wallet};
use credential_gateway::config::{load_config, GatewayConfig};
use credential_gateway::credentials::CredentialService;
use credential_gateway::http::HttpServer;
use credential_gateway::lifecycle::{spawn_signal_listener, Shutdown};
use credential_gateway::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "credential-gateway")]
#[command(about = "REST gateway for the on-chain credential registry", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "credential-gateway starting");
    tracing::info!(
        bind_address = %config.api.bind_address(),
        rpc_url = %config.blockchain.rpc_url,
        chain_id = config.blockchain.chain_id,
        request_timeout_secs = config.api.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let chain = build_chain(&config).await?;
    let service = CredentialService::new(Arc::new(chain));

    let listener = TcpListener::bind(config.api.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    HttpServer::new(&config, service)
        .run(listener, shutdown.wait())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Connect to the node, bind the contract and load the signer.
///
/// An unreachable node or missing contract artifacts leave the gateway
/// running in a degraded state. A malformed signer key is fatal.
async fn build_chain(config: &GatewayConfig) -> Result<ChainAdapter, Box<dyn std::error::Error>> {
    let mut chain = match ChainAdapter::connect(&config.blockchain).await {
        Ok(chain) => chain,
        Err(e) => {
            tracing::error!(error = %e, "Chain client unavailable; contract operations will fail");
            ChainAdapter::offline()
        }
    };

    match ContractArtifacts::load(
        Path::new(&config.contract.address_file),
        Path::new(&config.contract.abi_file),
    ) {
        Ok(artifacts) => {
            if let Err(e) = chain.bind_contract(artifacts) {
                tracing::error!(error = %e, "Contract artifacts rejected; contract operations will fail");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read contract artifacts; contract operations will fail");
        }
    }

    let wallet = match config.blockchain.private_key.as_deref() {
        Some(key) => Some(Wallet::from_private_key(key, config.blockchain.chain_id)?),
        None => None,
    };
    if let Some(wallet) = &wallet {
        tracing::info!(signer = %wallet.address(), "Transaction signer loaded");
    }
    chain.attach_signer(wallet, config.transactions.clone());

    Ok(chain)
}
