//! Request logging middleware.
//!
//! Each request is tagged with the pipeline stage its route drives.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pipeline stage behind a route; `None` for everything else.
fn stage_for(path: &str) -> Option<&'static str> {
    match path {
        "/api/upload" => Some("ingest"),
        "/api/validate-date-ranges" => Some("partition"),
        "/api/train-model" => Some("train"),
        "/api/simulate" => Some("simulate"),
        _ => None,
    }
}

/// Logs each request once its response head is ready. For the replay stream
/// this is when the stream opens, not when it ends.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Health probes stay silent
    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    let Some(stage) = stage_for(&path) else {
        debug!(%method, %path, status = status.as_u16(), latency_ms, "Unrouted request");
        return response;
    };

    if status.is_server_error() {
        warn!(stage, %method, status = status.as_u16(), latency_ms, "Stage failed");
    } else if status.is_client_error() {
        info!(stage, %method, status = status.as_u16(), latency_ms, "Stage rejected");
    } else {
        info!(stage, %method, status = status.as_u16(), latency_ms, "Stage completed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_routes() {
        assert_eq!(stage_for("/api/upload"), Some("ingest"));
        assert_eq!(stage_for("/api/simulate"), Some("simulate"));
        assert_eq!(stage_for("/health"), None);
        assert_eq!(stage_for("/api/upload/extra"), None);
    }
}
