//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! API routes and the static SPA share one Axum router. The route gate wraps
//! both, so page navigation is access-checked before any file is served;
//! `/api` paths bypass the gate and enforce auth in their handlers.

pub mod auth;
pub mod dashboard;

use std::path::PathBuf;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::gate;
use crate::state::AppState;

fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/callback", get(auth::oauth_callback))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/stream", get(auth::session_stream))
        .route("/api/dashboard/nav", get(dashboard::nav))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// Resolve the directory holding the built SPA.
fn site_dir() -> PathBuf {
    std::env::var("SITE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("site"))
}

/// Full application: API routes plus the gated SPA fallback.
pub fn app(state: AppState) -> Router {
    let site = site_dir();
    let spa = ServeDir::new(&site)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(site.join("index.html")));

    Router::new()
        .merge(api_routes(state.clone()))
        .fallback_service(spa)
        .layer(axum::middleware::from_fn_with_state(state, gate::route_gate))
        .layer(TraceLayer::new_for_http())
}

async fn healthz(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
