//! Entry point: load config, wire dependencies, and run the server.

use authstarter::auth::{Argon2Hasher, JwtTokenService};
use authstarter::config::{Config, StoreBackend};
use authstarter::db;
use authstarter::repositories::{InMemoryUserStore, PgUserStore, UserStore};
use authstarter::{create_app, AppState, AuthService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let users: Arc<dyn UserStore> = match config.user_store {
        StoreBackend::Postgres => {
            let db_pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&db_pool).await?;
            Arc::new(PgUserStore::new(db_pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory user store; accounts are lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };
    let hasher = Arc::new(Argon2Hasher::new(config.hash_params)?);
    let tokens = Arc::new(JwtTokenService::new(
        &config.jwt_secret,
        chrono::Duration::seconds(config.token_ttl_secs),
    ));
    let auth_service = AuthService::new(users, hasher, tokens)?;

    let app = create_app(AppState::new(auth_service));

    tracing::info!(
        addr = %config.server_addr,
        store = ?config.user_store,
        token_ttl_secs = config.token_ttl_secs,
        "listening"
    );
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
