//! Common library for the SalaFácil services
//!
//! This crate provides shared functionality used by the authentication and
//! reservation services: database connectivity and migrations, environment
//! driven configuration, logging bootstrap and JWT handling.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     println!("Database health check: {}", health_check(&pool).await);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod logging;
pub mod settings;
pub mod token;
