/*
 * Responsibility
 * - v1 URL structure
 * - Decide the protected scope here: everything except /health goes through
 *   the external auth delegation filter
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{echo::echo, health::health};
use crate::middleware::external_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/echo", post(echo));
    let protected = external_auth::apply(protected, state);

    Router::new().route("/health", get(health)).merge(protected)
}
