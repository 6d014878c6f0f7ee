use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use common::metrics::{status_class, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};

/// Count requests by method and status class and observe their latency.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let start = Instant::now();
    let res = next.run(req).await;
    let class = status_class(res.status().as_u16());
    HTTP_REQUESTS_TOTAL.with_label_values(&[method.as_str(), class]).inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str()])
        .observe(start.elapsed().as_secs_f64());
    res
}
