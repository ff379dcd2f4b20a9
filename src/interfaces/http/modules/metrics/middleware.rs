//! HTTP request metrics middleware

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

const METRICS_ROUTE: &str = "/metrics";

/// Route template for the `path` label. Approval links and upload names are
/// secrets or unbounded, so only the template is recorded and unmatched
/// requests share one label.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Records `http_requests_total{method,path,status}`,
/// `http_request_duration_seconds{method,path}` and
/// `http_server_errors_total{path}`. Prometheus scrapes are not counted.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let path = route_label(&request);
    if path == METRICS_ROUTE {
        return next.run(request).await;
    }
    let method = request.method().as_str().to_string();

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    let status = response.status();
    if status.is_server_error() {
        metrics::counter!("http_server_errors_total", "path" => path.clone()).increment(1);
    }
    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(elapsed);

    response
}
