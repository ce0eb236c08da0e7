//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, CORS, request ID, trace, timeout)
//!     → middleware/ (per-route metrics)
//!     → extract.rs + request.rs (JSON bodies, query strings; rejections → 400)
//!     → handlers.rs → credentials::CredentialService
//!     → response.rs (JSON shapes) | error.rs (status + {detail, kind})
//! ```

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer};
