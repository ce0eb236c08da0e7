//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every API route
//! - Wire up middleware (tracing, timeout, request ID, CORS, metrics)
//! - Serve on a listener until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::credentials::CredentialService;
use crate::http::handlers;
use crate::http::middleware::track_metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: CredentialService,
    /// Base URL of the frontend, used for verification links.
    pub frontend_url: Arc<str>,
}

impl AppState {
    pub fn new(service: CredentialService, frontend_url: &str) -> Self {
        Self {
            service,
            frontend_url: Arc::from(frontend_url),
        }
    }
}

/// HTTP server for the credential API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, service: CredentialService) -> Self {
        let state = AppState::new(service, &config.frontend.base_url);
        Self {
            router: build_router(config, state),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Accept connections on `listener` until `shutdown` resolves, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all routes and middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/contract/info", get(handlers::contract_info))
        .route("/api/credentials/issue", post(handlers::issue_credential))
        .route("/api/credentials/verify/{credential_id}", get(handlers::verify_credential))
        .route("/api/credentials/revoke/{credential_id}", post(handlers::revoke_credential))
        .route("/api/credentials/{credential_id}", get(handlers::get_credential))
        .route("/api/credentials/{credential_id}/qr", get(handlers::credential_qr))
        .route("/api/credentials/{credential_id}/pdf", get(handlers::credential_pdf))
        .route("/api/issuers/authorize", post(handlers::authorize_issuer))
        .route("/api/issuers/{issuer_address}/credentials", get(handlers::issuer_credentials))
        .route("/api/issuers/{issuer_address}/authorized", get(handlers::issuer_authorized))
        .route("/api/recipients/{email}/credentials", get(handlers::recipient_credentials))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.api.request_timeout_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(&config.api.cors_origins))
}

/// Permissive unless origins are configured. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
