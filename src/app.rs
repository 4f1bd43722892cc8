/*
 * Responsibility
 * - config load → dependency wiring → Router assembly
 * - TLS listener via axum_server (the API server only talks https)
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tower_http::{
    limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::services::directory::LdapDirectory;
use crate::state::AppState;

// TokenReview envelopes are tiny; anything larger is not the API server.
const MAX_BODY_BYTES: usize = 64 * 1024;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,authn_webhook=debug,tower_http=debug cargo run
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
        // Always surface panics via tracing so they don't get "lost"
        // (stderr can be hidden depending on how the process is launched.)
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        // In production, prefer the default behavior (stderr) and let the server keep running.
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

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting webhook in {:?} mode on {}, LDAP backend {}",
        config.app_env,
        config.addr,
        config.ldap_url
    );

    let state = build_state(&config);
    let app = build_router(state).layer(TimeoutLayer::new(config.request_timeout));

    let tls = RustlsConfig::from_pem_file(&config.tls_cert_path, &config.tls_key_path).await?;
    axum_server::bind_rustls(config.addr, tls)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

fn build_state(config: &Config) -> AppState {
    AppState::new(Arc::new(LdapDirectory::new(config)))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api::v1::routes())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
