use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use tracing::{debug, info};

use crate::domain::geo::EARTH_RADIUS_M;
use crate::errors::ServerError;

const SEED_SQL: &str = include_str!("../../sql/seed.sql");

// Thread-local connection slots, one per database path.
thread_local! {
    static DB_CONNS: RefCell<HashMap<String, Connection>> = RefCell::new(HashMap::new());
}

/// Handle to the listings store. Cheap to clone; every worker thread opens
/// its own connection on first use.
#[derive(Clone, Debug)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    ///
    /// Must not be re-entered from inside `f`.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ServerError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut slots = cell.borrow_mut();
                if !slots.contains_key(&self.path) {
                    let conn = open_connection(&self.path)?;
                    slots.insert(self.path.clone(), conn);
                }
                let conn = slots
                    .get_mut(&self.path)
                    .ok_or(ServerError::InternalError)?;
                f(conn)
            })
            .map_err(|_| ServerError::InternalError)?
    }
}

fn open_connection(path: &str) -> Result<Connection, ServerError> {
    let conn = Connection::open(path)
        .map_err(|e| ServerError::DbError(format!("Open DB failed: {e}")))?;

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| ServerError::DbError(format!("Enable foreign keys failed: {e}")))?;

    register_geo_functions(&conn)?;

    debug!(path, "opened sqlite connection");
    Ok(conn)
}

/// `geo_distance_m(lat1, lon1, lat2, lon2)` returns the spherical distance in
/// meters, or NULL when either point is missing. This is the store-side
/// distance used for the radius bound and nearest-first ordering.
fn register_geo_functions(conn: &Connection) -> Result<(), ServerError> {
    conn.create_scalar_function(
        "geo_distance_m",
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let lat1 = ctx.get::<Option<f64>>(0)?;
            let lon1 = ctx.get::<Option<f64>>(1)?;
            let lat2 = ctx.get::<Option<f64>>(2)?;
            let lon2 = ctx.get::<Option<f64>>(3)?;

            Ok(match (lat1, lon1, lat2, lon2) {
                (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => {
                    Some(spherical_distance_m(lat1, lon1, lat2, lon2))
                }
                _ => None,
            })
        },
    )
    .map_err(|e| ServerError::DbError(format!("Register geo_distance_m failed: {e}")))
}

/// Spherical law of cosines.
fn spherical_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let delta_lambda = (lon2 - lon1).to_radians();
    let cos_angle = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos();
    EARTH_RADIUS_M * cos_angle.clamp(-1.0, 1.0).acos()
}

/// Initialize database from a SQL schema file
pub fn init_db(db: &Database, schema_path: &str) -> Result<(), ServerError> {
    let schema_sql = fs::read_to_string(schema_path)
        .map_err(|e| ServerError::DbError(format!("Failed to read schema file: {e}")))?;

    db.with_conn(|conn| {
        conn.execute_batch(&schema_sql)
            .map_err(|e| ServerError::DbError(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    info!(schema_path, "database initialized");
    Ok(())
}

/// Load the bundled demo treks, hosts and reviews.
pub fn seed_demo_data(db: &Database) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(SEED_SQL)
            .map_err(|e| ServerError::DbError(format!("Failed to apply seed data: {e}")))?;
        tx.commit()?;
        Ok(())
    })?;

    info!("demo data loaded");
    Ok(())
}
