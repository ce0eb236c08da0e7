//! Per-request metrics.
//!
//! Routes are labelled by their matched pattern (`/api/credentials/{id}`),
//! never by the raw path, to keep label cardinality bounded.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

const UNMATCHED_ROUTE: &str = "unmatched";

pub async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();
    metrics::record_http_request(&method, &route, status, elapsed);
    tracing::debug!(
        method = %method,
        route = %route,
        status,
        elapsed_ms = elapsed.as_millis() as u64,
        "Request completed"
    );
    response
}
