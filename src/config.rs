// src/config.rs
use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use tracing::{info, warn};

use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub schema_path: String,
    /// Load `sql/seed.sql` after the schema (demo treks, hosts, reviews).
    pub seed_demo_data: bool,
    pub max_workers: usize,
}

impl Config {
    pub fn load() -> Result<Self, ServerError> {
        Ok(Self {
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:3000")?,
            database_path: try_load("DATABASE_PATH", "trek_finder.sqlite3")?,
            schema_path: try_load("SCHEMA_PATH", "sql/schema.sql")?,
            seed_demo_data: try_load("SEED_DEMO_DATA", "false")?,
            max_workers: try_load("MAX_WORKERS", "8")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ServerError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ServerError::Config(format!("invalid {key}: {e}"))
    })
}
