use crate::config::Config;
use crate::db::connection::{init_db, seed_demo_data, Database};
use crate::router::respond;
use astra::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod errors;
mod params;
mod responses;
mod router;
mod search;


fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.database_path.clone());

    if let Err(e) = init_db(&db, &config.schema_path) {
        error!("Database initialization failed: {e}");
        std::process::exit(1);
    }

    if config.seed_demo_data {
        if let Err(e) = seed_demo_data(&db) {
            error!("Loading demo data failed: {e}");
            std::process::exit(1);
        }
    }

    info!(addr = %config.bind_addr, workers = config.max_workers, "starting server");

    let server = Server::bind(config.bind_addr).max_workers(config.max_workers);

    let result = server.serve(move |req, _info| respond(req, &db));

    if let Err(e) = result {
        error!("Server ended with error: {e}");
    }

    info!("server shut down");
}
