/*
 * Responsibility
 * - App-wide AppError definition (the delegation filter's failure taxonomy)
 * - IntoResponse mapping (HTTP status / JSON error body)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Local failures of the auth delegation filter.
///
/// An authorizer denial (non-200 probe response) is deliberately absent here:
/// a denial is relayed to the caller as the authorizer produced it, never
/// surfaced as a gateway error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("invalid namespace payload: {0}")]
    NamespaceParse(#[source] serde_json::Error),

    #[error("namespace is not a valid header value")]
    NamespaceHeader,

    // Probe construction failures are kept apart from call failures so a bad
    // configuration never masquerades as an unreachable authorizer.
    #[error("failed to build upstream auth request: {0}")]
    ProbeBuild(#[source] reqwest::Error),

    #[error("upstream auth call failed: {0}")]
    UpstreamCall(#[source] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every variant is terminal for the request: the caller gets a plain
        // 500 carrying the diagnostic text, and downstream is never reached.
        let code = match &self {
            AppError::BodyRead(_) => "BODY_READ",
            AppError::NamespaceParse(_) => "NAMESPACE_PARSE",
            AppError::NamespaceHeader => "NAMESPACE_HEADER",
            AppError::ProbeBuild(_) => "UPSTREAM_AUTH_REQUEST",
            AppError::UpstreamCall(_) => "UPSTREAM_AUTH_CALL",
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
