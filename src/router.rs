use crate::db::connection::Database;
use crate::domain::listing::ListingKind;
use crate::domain::rating::{DEFAULT_MIN_RATING, DEFAULT_TOP_RATED_LIMIT};
use crate::errors::{ResultResp, ServerError};
use crate::params::QueryParams;
use crate::responses::{error_to_response, json_ok};
use crate::search::listings::{self as listing_search, DEFAULT_ALL_TREKS_LIMIT, DEFAULT_FEATURED_LIMIT};
use crate::search::nearby::{self, format_radius_km, NearbyQuery};
use crate::search::{reviews, top_rated};
use astra::{Request, Response};
use serde_json::json;
use tracing::debug;

/// Route a request, turning any error into its JSON error response.
pub fn respond(req: Request, db: &Database) -> Response {
    match handle(req, db) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    }
}

pub fn handle(req: Request, db: &Database) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();
    let params = QueryParams::from_request(&req);

    debug!(method, path, "request");

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        ("GET", ["health"]) => json_ok(&json!({ "status": "ok", "message": "Server is running" })),

        ("GET", ["api", "posts"]) => get_posts(&params, db),
        ("GET", ["api", "posts", "treks"]) => get_treks(&params, db),
        ("GET", ["api", "posts", "all", "treks"]) => get_all_treks(&params, db),
        ("GET", ["api", "posts", "featured", "treks"]) => get_featured_treks(&params, db),
        ("GET", ["api", "posts", "nearby", "treks"]) | ("GET", ["nearby-treks"]) => {
            get_nearby_treks(&params, db)
        }
        ("GET", ["api", "posts", "top-rated", "treks"]) | ("GET", ["top-rated-treks"]) => {
            get_top_rated_treks(&params, db)
        }
        ("GET", ["api", "posts", "treks", id]) => get_trek(id, db),
        ("GET", ["api", "posts", "user", user_id]) => get_user_posts(user_id, db),
        ("GET", ["api", "posts", id]) => get_post(id, db),

        ("GET", ["api", "users", "top-rated", "hosts"]) | ("GET", ["top-rated-hosts"]) => {
            get_top_rated_hosts(&params, db)
        }

        ("GET", ["api", "reviews", "host", host_id]) => get_host_reviews(host_id, &params, db),
        ("GET", ["api", "reviews", "reviewer", reviewer_id]) => {
            get_reviewer_reviews(reviewer_id, &params, db)
        }
        ("GET", ["api", "reviews", id]) => get_review(id, db),

        _ => Err(ServerError::NotFound),
    }
}

fn get_posts(params: &QueryParams, db: &Database) -> ResultResp {
    let filters = params.listing_filters()?;
    let page = listing_search::page(params.page()?, params.limit()?)?;
    let result = listing_search::search_listings(db, &filters, page)?;

    json_ok(&json!({
        "success": true,
        "count": result.listings.len(),
        "total": result.total,
        "page": result.page,
        "totalPages": result.total_pages,
        "posts": result.listings,
    }))
}

fn get_treks(params: &QueryParams, db: &Database) -> ResultResp {
    let filters = params.listing_filters()?;
    let page = listing_search::page(params.page()?, params.limit()?)?;
    let ascending = params.get("order") == Some("asc");
    let result = listing_search::search_treks(db, &filters, params.get("sortBy"), ascending, page)?;

    json_ok(&json!({
        "success": true,
        "count": result.listings.len(),
        "total": result.total,
        "page": result.page,
        "totalPages": result.total_pages,
        "treks": result.listings,
    }))
}

fn get_all_treks(params: &QueryParams, db: &Database) -> ResultResp {
    let limit = params.limit()?.or(Some(DEFAULT_ALL_TREKS_LIMIT));
    let page = listing_search::page(params.page()?, limit)?;
    let result = listing_search::all_treks(db, page)?;

    json_ok(&json!({
        "success": true,
        "count": result.listings.len(),
        "total": result.total,
        "page": result.page,
        "totalPages": result.total_pages,
        "posts": result.listings,
    }))
}

fn get_featured_treks(params: &QueryParams, db: &Database) -> ResultResp {
    let limit = params.limit()?.unwrap_or(DEFAULT_FEATURED_LIMIT);
    let posts = listing_search::featured_treks(db, limit)?;

    json_ok(&json!({
        "success": true,
        "count": posts.len(),
        "posts": posts,
    }))
}

fn get_post(id: &str, db: &Database) -> ResultResp {
    let post = listing_search::get_listing(db, parse_id(id, "post")?)?;

    json_ok(&json!({ "success": true, "post": post }))
}

fn get_trek(id: &str, db: &Database) -> ResultResp {
    let trek = listing_search::get_trek(db, parse_id(id, "trek")?)?;

    json_ok(&json!({ "success": true, "trek": trek }))
}

fn get_user_posts(user_id: &str, db: &Database) -> ResultResp {
    let posts = listing_search::posts_by_owner(db, parse_id(user_id, "user")?)?;

    json_ok(&json!({
        "success": true,
        "count": posts.len(),
        "posts": posts,
    }))
}

fn get_nearby_treks(params: &QueryParams, db: &Database) -> ResultResp {
    let (Some(lat), Some(lon)) = (params.get("latitude"), params.get("longitude")) else {
        return Err(ServerError::BadRequest(
            "Latitude and longitude are required".into(),
        ));
    };
    let latitude: f64 = lat.parse().map_err(|_| ServerError::InvalidCoordinates)?;
    let longitude: f64 = lon.parse().map_err(|_| ServerError::InvalidCoordinates)?;

    let query = NearbyQuery {
        max_distance_m: params.parse_with("maxDistance", || ServerError::InvalidRadius)?,
        limit: params.limit()?,
        filters: params.nearby_filters()?,
        ..NearbyQuery::new(latitude, longitude, ListingKind::Trek)
    };

    let result = nearby::find_nearby(db, &query)?;

    json_ok(&json!({
        "success": true,
        "count": result.listings.len(),
        "searchLocation": {
            "latitude": result.origin.latitude,
            "longitude": result.origin.longitude,
            "maxDistance": format_radius_km(result.max_distance_m),
        },
        "treks": result.listings,
    }))
}

fn get_top_rated_treks(params: &QueryParams, db: &Database) -> ResultResp {
    let min_rating = params.min_rating()?.unwrap_or(DEFAULT_MIN_RATING);
    let limit = params.limit()?.unwrap_or(DEFAULT_TOP_RATED_LIMIT);
    let treks = top_rated::top_rated_listings(db, ListingKind::Trek, min_rating, limit)?;

    json_ok(&json!({
        "success": true,
        "count": treks.len(),
        "treks": treks,
    }))
}

fn get_top_rated_hosts(params: &QueryParams, db: &Database) -> ResultResp {
    let min_rating = params.min_rating()?.unwrap_or(DEFAULT_MIN_RATING);
    let limit = params.limit()?.unwrap_or(DEFAULT_TOP_RATED_LIMIT);
    let hosts = top_rated::top_rated_hosts(db, min_rating, limit, params.get("location"))?;

    json_ok(&json!({
        "success": true,
        "count": hosts.len(),
        "hosts": hosts,
    }))
}

fn get_host_reviews(host_id: &str, params: &QueryParams, db: &Database) -> ResultResp {
    let host_id = parse_id(host_id, "host")?;
    let rating = params.integer("rating")?;
    let page = listing_search::page(params.page()?, params.limit()?)?;
    let summary = reviews::host_review_summary(db, host_id, rating, page)?;

    json_ok(&summary)
}

fn get_reviewer_reviews(reviewer_id: &str, params: &QueryParams, db: &Database) -> ResultResp {
    let reviewer_id = parse_id(reviewer_id, "reviewer")?;
    let page = listing_search::page(params.page()?, params.limit()?)?;
    let result = reviews::reviewer_reviews(db, reviewer_id, page)?;

    json_ok(&json!({
        "success": true,
        "count": result.reviews.len(),
        "total": result.total,
        "page": result.page,
        "totalPages": result.total_pages,
        "reviews": result.reviews,
    }))
}

fn get_review(id: &str, db: &Database) -> ResultResp {
    let review = reviews::get_review(db, parse_id(id, "review")?)?;

    json_ok(&json!({ "success": true, "review": review }))
}

fn parse_id(raw: &str, what: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid {what} id")))
}
