mod db;
mod gate;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::identity::{HostedIdentity, IdentityConfig, IdentityProvider};
use services::profile::{PgProfiles, ProfileStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    // Identity service client (non-fatal: login disabled if config missing).
    let identity: Option<Arc<dyn IdentityProvider>> = match IdentityConfig::from_env() {
        Some(config) => match HostedIdentity::new(config) {
            Ok(client) => {
                tracing::info!("identity service client initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity client failed to build — login disabled");
                None
            }
        },
        None => {
            tracing::warn!("AUTH_SERVICE_URL/AUTH_SERVICE_KEY not set — login disabled");
            None
        }
    };

    let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfiles::new(pool.clone()));
    let state = state::AppState::new(pool, identity, profiles);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "homestead listening");
    axum::serve(listener, app).await.expect("server failed");
}
