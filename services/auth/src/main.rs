use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod config;
mod error;
mod jwt;
mod middleware;
mod models;
mod password;
mod repositories;
mod routes;
mod validation;

use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    token::JwtConfig,
};

use crate::{
    config::ServerConfig,
    jwt::JwtService,
    repositories::{UserRepository, UserStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub jwt_service: JwtService,
}

#[tokio::main]
async fn main() -> Result<()> {
    common::logging::init("auth");

    info!("Starting authentication service");

    let server_config = ServerConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if !health_check(&pool).await {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;
    info!("Database connection successful");

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let app_state = AppState {
        users: Arc::new(UserRepository::new(pool)),
        jwt_service,
    };

    let app = routes::create_router(app_state);

    let address = server_config.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Authentication service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
