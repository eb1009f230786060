/*
 * Responsibility
 * - POST /echo (protected demo endpoint)
 * - Returns the request body verbatim, which makes the filter's
 *   consume-and-restore guarantee observable end to end
 */
use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

pub async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));

    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body)
}
