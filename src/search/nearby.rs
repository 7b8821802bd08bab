// src/search/nearby.rs
use tracing::debug;

use crate::db::connection::Database;
use crate::db::listings;
use crate::domain::geo::Coordinates;
use crate::domain::listing::{ListingFilters, ListingKind, ListingStatus};
use crate::domain::rating::validate_limit;
use crate::errors::ServerError;
use crate::responses::assemble::{nearby_listing, NearbyListing};

/// 100 km
pub const DEFAULT_MAX_DISTANCE_M: f64 = 100_000.0;
pub const DEFAULT_NEARBY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub max_distance_m: Option<f64>,
    pub kind: ListingKind,
    /// Only difficulty, categories and the price range are meaningful here.
    pub filters: ListingFilters,
    pub limit: Option<usize>,
}

impl NearbyQuery {
    pub fn new(latitude: f64, longitude: f64, kind: ListingKind) -> Self {
        Self {
            latitude,
            longitude,
            max_distance_m: None,
            kind,
            filters: ListingFilters::default(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NearbyResult {
    pub origin: Coordinates,
    pub max_distance_m: f64,
    pub listings: Vec<NearbyListing>,
}

pub fn validate_radius(max_distance_m: f64) -> Result<f64, ServerError> {
    if !max_distance_m.is_finite() || max_distance_m <= 0.0 {
        return Err(ServerError::InvalidRadius);
    }
    Ok(max_distance_m)
}

/// Active listings of `query.kind` within the radius, nearest first.
///
/// The store bounds and orders the candidates; each survivor then gets a
/// Haversine display distance. Store order is kept as-is.
pub fn find_nearby(db: &Database, query: &NearbyQuery) -> Result<NearbyResult, ServerError> {
    let origin = Coordinates::new(query.latitude, query.longitude)?;
    let max_distance_m = validate_radius(query.max_distance_m.unwrap_or(DEFAULT_MAX_DISTANCE_M))?;
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_NEARBY_LIMIT))?;

    let filters = ListingFilters {
        kind: Some(query.kind),
        status: Some(ListingStatus::Active),
        ..query.filters.clone()
    };

    let rows = db.with_conn(|conn| {
        listings::find_nearby(conn, origin, max_distance_m, &filters, limit)
    })?;

    debug!(
        lat = origin.latitude,
        lon = origin.longitude,
        max_distance_m,
        found = rows.len(),
        "nearby search"
    );

    let listings = rows
        .into_iter()
        .filter_map(|row| nearby_listing(&origin, row.listing))
        .collect();

    Ok(NearbyResult {
        origin,
        max_distance_m,
        listings,
    })
}

/// "100km", "50.5km"
pub fn format_radius_km(max_distance_m: f64) -> String {
    format!("{}km", max_distance_m / 1000.0)
}
