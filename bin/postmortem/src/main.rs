//! # Postmortem Binary
//!
//! The entry point that assembles the store, auth provider and router from
//! configuration.

mod seed;

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use pm_api::{router, AppState, SiteOptions};
use pm_auth_argon::ArgonAuthProvider;
use pm_config::{LogFormat, Settings};
use pm_store_json::JsonFileStore;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings);

    if settings.uses_default_secret() {
        warn!("auth.session_secret is not set; sessions are signed with a public placeholder");
    }

    let store = Arc::new(JsonFileStore::new(settings.storage.data_dir.clone()));
    info!(data_dir = %store.root().display(), "using JSON file store");

    if settings.storage.seed_on_empty {
        seed::seed_if_empty(store.as_ref())
            .await
            .context("seeding sample stories")?;
    }

    let ttl = Duration::hours(settings.auth.session_ttl_hours);
    let auth = Arc::new(ArgonAuthProvider::new(
        settings.auth.session_secret.expose_secret().as_bytes(),
        ttl,
    ));

    let options = SiteOptions {
        site_name: settings.site.name.clone(),
        require_login_to_submit: settings.auth.require_login_to_submit,
        min_password_len: settings.auth.min_password_len,
        session_max_age_secs: ttl.num_seconds(),
    };

    let state = AppState::new(store, auth, options);
    let app = router(state, Some(settings.site.static_dir.clone()));

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding to {address}"))?;
    info!("{} running on http://{address}", settings.site.name);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
