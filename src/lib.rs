//! Credential Registry Gateway library.
//!
//! REST gateway over an on-chain credential registry: issue, verify, revoke
//! and list credentials, with QR and PDF presentation artifacts.

pub mod blockchain;
pub mod config;
pub mod credentials;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod presentation;

pub use config::GatewayConfig;
pub use credentials::CredentialService;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
