//! Process-level plumbing shared by the server binary and its modules:
//! layered configuration, logging, database connection and shutdown signals.

pub mod config;
pub mod db;
pub mod logging;
pub mod paths;
pub mod shutdown;
pub mod sqlite;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
