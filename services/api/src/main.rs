use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

mod config;
mod error;
mod fallback;
mod middleware;
mod models;
mod notify;
mod repositories;
mod routes;
mod service;
mod state;
mod validation;

use common::{
    database::{
        DatabaseConfig, health_check, init_lazy_pool, run_migrations,
        run_migrations_when_reachable,
    },
    token::{JwtConfig, TokenKeys},
};

use crate::{
    config::{ServerConfig, StorageBackend, StorageConfig},
    middleware::Identity,
    notify::{LogNotifier, Notifier, PgNotifier},
    repositories::{MemoryStore, PgReservationStore, PgRoomDirectory, ReservationStore, RoomDirectory},
    service::{DegradePolicy, ReservationService},
    state::AppState,
};

/// Interval between connection attempts while migrations are deferred
const MIGRATION_RETRY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    common::logging::init("api");

    info!("Starting API service");

    let server_config = ServerConfig::from_env()?;
    let storage_config = StorageConfig::from_env()?;

    let (store, rooms, notifier): (
        Arc<dyn ReservationStore>,
        Arc<dyn RoomDirectory>,
        Arc<dyn Notifier>,
    ) = match storage_config.backend {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_lazy_pool(&db_config)?;

            if health_check(&pool).await {
                run_migrations(&pool).await?;
                info!("Database connection successful");
            } else {
                warn!("Database unreachable at startup, serving in degraded mode");
                let pool = pool.clone();
                tokio::spawn(async move {
                    match run_migrations_when_reachable(&pool, MIGRATION_RETRY).await {
                        Ok(()) => info!("Database reachable, deferred migrations applied"),
                        Err(e) => error!("Deferred migrations failed: {}", e),
                    }
                });
            }

            let store: Arc<dyn ReservationStore> = Arc::new(PgReservationStore::new(pool.clone()));
            let rooms: Arc<dyn RoomDirectory> = Arc::new(PgRoomDirectory::new(pool.clone()));
            let notifier: Arc<dyn Notifier> = Arc::new(PgNotifier::new(pool));
            (store, rooms, notifier)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            let memory = Arc::new(MemoryStore::with_rooms(fallback::rooms()));
            let store: Arc<dyn ReservationStore> = memory.clone();
            let rooms: Arc<dyn RoomDirectory> = memory;
            let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
            (store, rooms, notifier)
        }
    };

    let identity = match TokenKeys::new(&JwtConfig::from_env()?.secret) {
        Ok(keys) => Identity::new(keys),
        Err(e) => {
            warn!("{}; every caller is treated as anonymous", e);
            Identity::anonymous()
        }
    };

    let service = ReservationService::new(
        store,
        rooms,
        DegradePolicy {
            fallback_reads: storage_config.fallback_reads,
        },
    );

    let app_state = AppState {
        service,
        identity,
        notifier,
    };

    let app = routes::create_router(app_state);

    let address = server_config.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
