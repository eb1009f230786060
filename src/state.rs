/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Clone-cheap by construction (inner Arc); read-only after startup
 */
use std::sync::Arc;

use crate::middleware::external_auth::ExternalAuth;

#[derive(Clone, Debug)]
pub struct AppState {
    pub external_auth: Arc<ExternalAuth>,
}

impl AppState {
    pub fn new(external_auth: Arc<ExternalAuth>) -> Self {
        Self { external_auth }
    }
}
