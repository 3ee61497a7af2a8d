use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time");

/// Wraps the rest of the pipeline, logs how long the request took and stamps
/// the same figure on the response as `X-Response-Time`.
pub async fn request_timer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let full_path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let mut response = next.run(request).await;

    let duration = format_seconds(start.elapsed());
    tracing::info!(
        method = %method,
        path = %full_path,
        duration = %duration,
        "{} {} took {} seconds",
        method,
        full_path,
        duration
    );

    if let Ok(value) = HeaderValue::from_str(&format!("{}s", duration)) {
        response.headers_mut().insert(RESPONSE_TIME_HEADER, value);
    }
    response
}

/// Seconds with millisecond precision, e.g. `0.042`.
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{:.3}", elapsed.as_secs_f64())
}
