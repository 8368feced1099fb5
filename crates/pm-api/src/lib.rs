//! # pm-api
//!
//! The web routing and orchestration layer for Postmortem.

pub mod api;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use pm_core::traits::{AuthProvider, CollectionStore};
use tower_http::services::ServeDir;

/// Site-level switches the handlers need, resolved from configuration by the
/// binary.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub site_name: String,
    pub require_login_to_submit: bool,
    pub min_password_len: usize,
    pub session_max_age_secs: i64,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            site_name: "YC Postmortem".to_string(),
            require_login_to_submit: false,
            min_password_len: 8,
            session_max_age_secs: 7 * 24 * 3600,
        }
    }
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CollectionStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub options: Arc<SiteOptions>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        auth: Arc<dyn AuthProvider>,
        options: SiteOptions,
    ) -> Self {
        Self {
            store,
            auth,
            options: Arc::new(options),
        }
    }
}

/// Builds the full application router.
///
/// Static assets are mounted under `/static` when a directory is given.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::index))
        .route("/story/{id}", get(handlers::view_story))
        .route("/submit", get(handlers::submit_form).post(handlers::submit_story))
        .route("/stats", get(handlers::stats))
        .route("/register", get(handlers::register_form).post(handlers::register))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/api/vote", post(api::vote))
        .route("/api/comment", post(api::comment))
        .fallback(handlers::not_found);

    if let Some(dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(middleware::cors_policy())
        .layer(middleware::nosniff())
        .layer(middleware::referrer_policy())
        .layer(middleware::trace_layer())
        .with_state(state)
}
