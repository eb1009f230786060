//! Delegated authentication for the protected API surface.
//!
//! Every request entering the protected router is first summarized into a
//! probe (GET, copy of the inbound headers, optional `X-Namespace`) and sent
//! to an external authorization service. A 200 from that service lets the
//! original request continue to the inner handler; any other response is
//! relayed back to the caller exactly as the authorizer produced it.
//!
//! Responsibility:
//! - Probe construction (header copy + namespace resolution)
//! - Bounded upstream call (per-request deadline on an injected client)
//! - Delegate-or-relay branch
//!
//! Notes:
//! - Exactly one probe is issued per inbound request; failures are never
//!   retried here.
//! - When the namespace comes from the body, the body is buffered once and
//!   re-attached so the inner handler still sees the original bytes.

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use url::Url;

use crate::config::NamespaceSource;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the resolved namespace to the authorizer.
const X_NAMESPACE: HeaderName = HeaderName::from_static("x-namespace");

/// Immutable configuration of the delegation filter.
///
/// Built once at startup, shared read-only across all in-flight requests.
#[derive(Clone, Debug)]
pub struct ExternalAuth {
    client: reqwest::Client,
    upstream_url: Url,
    upstream_timeout: Duration,
    /// Whether the original body must stay available to the inner handler.
    /// Carried on the configuration surface for parity with the upstream
    /// gateway contract; the filter restores the body unconditionally
    /// whenever namespace extraction consumes it.
    pub pass_body: bool,
    namespace_source: NamespaceSource,
}

impl ExternalAuth {
    pub fn new(
        client: reqwest::Client,
        upstream_url: Url,
        upstream_timeout: Duration,
        pass_body: bool,
        namespace_source: NamespaceSource,
    ) -> Self {
        Self {
            client,
            upstream_url,
            upstream_timeout,
            pass_body,
            namespace_source,
        }
    }
}

/// Body payload recognized in `NamespaceSource::Body` mode.
///
/// Unknown fields are ignored; a missing field resolves to the empty
/// namespace without error.
#[derive(Debug, Deserialize)]
struct NamespacePayload {
    #[serde(rename = "Namespace", default)]
    namespace: String,
}

/// Gate every route of `router` on a successful upstream auth decision.
///
/// Ex:
/// ```ignore
/// let protected = external_auth::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8's from_fn cannot receive a State extractor, so the state is
    // passed explicitly with `from_fn_with_state`.
    router.layer(middleware::from_fn_with_state(state, external_auth_middleware))
}

async fn external_auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match delegate(&state.external_auth, req, next).await {
        Ok(res) => res,
        Err(err) => {
            // The single failure log line for this invocation; the same
            // diagnostic reaches the caller through the 500 body.
            tracing::error!(error = %err, "external auth delegation failed");
            err.into_response()
        }
    }
}

/// One delegation round: resolve the namespace, probe the authorizer, then
/// forward or relay.
async fn delegate(
    auth: &ExternalAuth,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let mut probe_headers = probe_header_copy(req.headers());

    let req = match auth.namespace_source {
        NamespaceSource::None => req,
        NamespaceSource::Body => {
            let (parts, body) = req.into_parts();

            // Buffer the whole body once. RequestBodyLimitLayer further out
            // keeps this bounded.
            let bytes = to_bytes(body, usize::MAX)
                .await
                .map_err(AppError::BodyRead)?;
            let payload: NamespacePayload =
                serde_json::from_slice(&bytes).map_err(AppError::NamespaceParse)?;
            probe_headers.append(
                X_NAMESPACE,
                HeaderValue::from_str(&payload.namespace)
                    .map_err(|_| AppError::NamespaceHeader)?,
            );

            // Hand the buffered bytes back so the inner handler sees the
            // original body.
            Request::from_parts(parts, Body::from(bytes))
        }
        NamespaceSource::QueryParam => {
            let namespace = query_namespace(req.uri().query());
            probe_headers.append(
                X_NAMESPACE,
                HeaderValue::from_str(&namespace).map_err(|_| AppError::NamespaceHeader)?,
            );
            req
        }
    };

    let probe = auth
        .client
        .get(auth.upstream_url.clone())
        .headers(probe_headers)
        .timeout(auth.upstream_timeout)
        .build()
        .map_err(AppError::ProbeBuild)?;

    // Sole suspension point of the filter, bounded by the configured deadline.
    // A deadline hit surfaces as UpstreamCall, never as a silent retry.
    let upstream_res = auth
        .client
        .execute(probe)
        .await
        .map_err(AppError::UpstreamCall)?;

    if upstream_res.status() == StatusCode::OK {
        // Authorized: the probe response is dropped unread and the original
        // request continues inward. Response writing now belongs downstream.
        drop(upstream_res);
        return Ok(next.run(req).await);
    }

    Ok(relay_rejection(upstream_res))
}

/// Copy of the inbound headers for the probe request.
///
/// `HeaderMap::clone` keeps multi-valued headers in insertion order. `Host`
/// and `Content-Length` describe the inbound hop and cannot hold for an
/// empty-body GET against the authorizer's own authority, so only those two
/// are not forwarded.
fn probe_header_copy(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

/// Value of the `namespace` query parameter, or the empty string when absent.
fn query_namespace(query: Option<&str>) -> String {
    let query = query.unwrap_or("");
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "namespace")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// Relay a non-200 authorizer response to the caller: status and headers
/// verbatim, body streamed through untouched.
fn relay_rejection(upstream_res: reqwest::Response) -> Response {
    let status = upstream_res.status();
    let mut headers = upstream_res.headers().clone();
    // This server re-frames the relayed stream, so hop-by-hop framing headers
    // must not survive the copy. Everything else is forwarded untouched.
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONNECTION);

    // A denial is an expected outcome of the authorizer, not a gateway
    // failure; keep it off the error log.
    tracing::debug!(status = %status, "upstream auth denied request");

    let mut res = Response::new(Body::from_stream(upstream_res.bytes_stream()));
    *res.status_mut() = status;
    *res.headers_mut() = headers;
    res
}
