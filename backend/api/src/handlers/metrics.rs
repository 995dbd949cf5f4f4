use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::metrics::metrics;

pub async fn scrape() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics().encode(),
    )
        .into_response()
}
