/*
 * Responsibility
 * - Config load → dependency construction → Router assembly
 * - Middleware application (external auth / CORS / security headers / HTTP infra)
 * - axum::serve() startup
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware::{self, external_auth::ExternalAuth},
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,auth_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics via tracing so they don't get lost when stderr is
        // hidden by the process supervisor.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    // Fail fast in development; in production prefer stderr + keep serving.
    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .context("bind listener")?;
    axum::serve(listener, app).await.context("serve")?;

    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    // One outbound client for the whole process, owned by the filter config
    // and injected here. The authorization deadline is attached per probe, so
    // the client itself carries no timeout.
    let client = reqwest::Client::builder()
        .build()
        .context("build upstream auth client")?;

    let external_auth = ExternalAuth::new(
        client,
        config.auth_upstream_url.clone(),
        config.auth_upstream_timeout,
        config.auth_pass_body,
        config.auth_namespace_source,
    );

    tracing::info!(
        upstream = %config.auth_upstream_url,
        timeout_ms = config.auth_upstream_timeout.as_millis() as u64,
        namespace_source = ?config.auth_namespace_source,
        pass_body = external_auth.pass_body,
        "external auth delegation configured"
    );

    Ok(AppState::new(Arc::new(external_auth)))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    let router = middleware::security_headers::apply(router);
    middleware::http::apply(router)
}
