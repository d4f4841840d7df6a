//! Request middleware: CORS, timing and cache headers for the web assets.
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::CorsLayer;
use tracing::info;

pub fn cors() -> CorsLayer {
    CorsLayer::permissive()
}

/// Log method, path and latency of every request.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

pub fn is_frontend_asset(path: &str) -> bool {
    path == "/" || [".html", ".js", ".css"].iter().any(|ext| path.ends_with(ext))
}

/// Keep browsers from caching the frontend between deploys.
pub async fn no_store_assets(req: Request<Body>, next: Next) -> Response {
    let asset = is_frontend_asset(req.uri().path());
    let mut response = next.run(req).await;
    if asset {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_assets() {
        assert!(is_frontend_asset("/"));
        assert!(is_frontend_asset("/index.html"));
        assert!(is_frontend_asset("/static/app.js"));
        assert!(!is_frontend_asset("/api/history"));
        assert!(!is_frontend_asset("/logo.png"));
    }
}
