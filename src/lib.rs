//! # Visitor Gate
//!
//! Visitor registration at a residential gate. Guards record visitors with a
//! photo, the resident they are visiting approves or rejects by an emailed
//! one-time link, and administrators read the log, the daily dashboard and
//! CSV/JSON exports.
//!
//! ## Architecture
//!
//! - **domain**: entities, lifecycle rules and repository contracts
//! - **application**: credential, visitor lifecycle and reporting services,
//!   outbound ports, the approval token sweep
//! - **infrastructure**: SeaORM storage, in-memory storage, SMTP email,
//!   plate recognition client, local image store, password and token crypto
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: process wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{init_database, run_migrations, DatabaseConfig};

pub use interfaces::http::{create_api_router, AppState, RouterOptions};

pub use server::{init_tracing, ServerHandle, ServerOptions};
