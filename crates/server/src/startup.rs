use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, StorageBackend};
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use models::user::UserRole;
use service::booking::BookingConfig;
use service::store::{memory::InMemoryStore, seaorm::SeaOrmStore, Store};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config file if present, built-in defaults otherwise
fn load_config() -> Result<AppConfig, StartupError> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut cfg = if Path::new(&path).exists() {
        configs::load_from_file(&path)?
    } else {
        warn!(path = %path, "config file not found, using defaults");
        AppConfig::default()
    };
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn seeded_memory_store(cfg: &AppConfig) -> Result<InMemoryStore, StartupError> {
    let store = InMemoryStore::new();
    for u in &cfg.storage.seed_users {
        let id = Uuid::parse_str(u.id.trim())
            .map_err(|_| StartupError::InvalidConfig(format!("storage.seed_users: bad id {}", u.id)))?;
        let role = UserRole::parse(&u.role)
            .ok_or_else(|| StartupError::InvalidConfig(format!("storage.seed_users: bad role {}", u.role)))?;
        store.add_user(id, role);
    }
    info!(users = cfg.storage.seed_users.len(), "memory store seeded");
    Ok(store)
}

/// Pick the store from `[storage]`; Postgres gets migrated before use.
pub async fn build_store(cfg: &AppConfig) -> Result<Arc<dyn Store>, StartupError> {
    match cfg.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(seeded_memory_store(cfg)?)),
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database)
                .await
                .map_err(|e| StartupError::Storage(e.to_string()))?;
            migration::Migrator::up(&db, None)
                .await
                .map_err(|e| StartupError::Storage(format!("migrate up: {e}")))?;
            info!("postgres store ready");
            Ok(Arc::new(SeaOrmStore::new(db)))
        }
    }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;
    let store = build_store(&cfg).await?;
    let state = AppState::new(store, BookingConfig::from_app(&cfg));
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, backend = ?cfg.storage.backend, require_paid_billing = cfg.lifecycle.require_paid_billing, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
