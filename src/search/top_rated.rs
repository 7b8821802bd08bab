// src/search/top_rated.rs
//
// group -> threshold -> rank -> cap -> join -> project -> location filter
//
// Aggregates are recomputed on every call; nothing is cached or persisted.

use rusqlite::Connection;
use tracing::debug;

use crate::db::connection::Database;
use crate::db::{listings, reviews, users};
use crate::domain::listing::{Listing, ListingKind, ListingStatus};
use crate::domain::rating::{select_top, validate_limit, validate_min_rating};
use crate::domain::review::{RatingGroup, TargetKind};
use crate::domain::user::{User, UserRole};
use crate::errors::ServerError;
use crate::responses::assemble::{rated_host, rated_listing, RatedHost, RatedListing};

/// Top-rated active listings of `kind`.
pub fn top_rated_listings(
    db: &Database,
    kind: ListingKind,
    min_rating: f64,
    limit: usize,
) -> Result<Vec<RatedListing>, ServerError> {
    let min_rating = validate_min_rating(min_rating)?;
    let limit = validate_limit(limit)?;

    db.with_conn(|conn| {
        let groups = reviews::rating_groups(conn, TargetKind::Listing)?;
        let top = select_top(groups, min_rating, limit);
        let joined = join_listings(conn, top, kind)?;

        Ok(joined
            .into_iter()
            .map(|(group, listing)| rated_listing(&group, listing))
            .collect())
    })
}

/// Top-rated hosts, optionally narrowed by a free-text location.
///
/// The location filter runs after the cap, so a location can leave fewer
/// than `limit` hosts even when more would match further down the ranking.
pub fn top_rated_hosts(
    db: &Database,
    min_rating: f64,
    limit: usize,
    location: Option<&str>,
) -> Result<Vec<RatedHost>, ServerError> {
    let min_rating = validate_min_rating(min_rating)?;
    let limit = validate_limit(limit)?;

    let hosts = db.with_conn(|conn| {
        let groups = reviews::rating_groups(conn, TargetKind::Host)?;
        let top = select_top(groups, min_rating, limit);
        let joined = join_hosts(conn, top)?;

        let mut hosts = Vec::with_capacity(joined.len());
        for (group, user) in joined {
            let posts = listings::post_counts_for_owner(conn, user.id)?;
            hosts.push(rated_host(&group, user, posts));
        }
        Ok(hosts)
    })?;

    Ok(match location {
        Some(needle) => filter_by_location(hosts, needle),
        None => hosts,
    })
}

/// Fetch each group's listing, keeping only active listings of `kind`.
/// Missing or ineligible targets are dropped.
fn join_listings(
    conn: &Connection,
    groups: Vec<RatingGroup>,
    kind: ListingKind,
) -> Result<Vec<(RatingGroup, Listing)>, ServerError> {
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        match listings::get_listing(conn, group.target_id)? {
            Some(listing) if listing.status == ListingStatus::Active && listing.kind == kind => {
                out.push((group, listing));
            }
            Some(_) => debug!(listing_id = group.target_id, "dropping ineligible listing"),
            None => debug!(listing_id = group.target_id, "dropping missing listing"),
        }
    }
    Ok(out)
}

/// Fetch each group's user, keeping only those with the host role.
fn join_hosts(
    conn: &Connection,
    groups: Vec<RatingGroup>,
) -> Result<Vec<(RatingGroup, User)>, ServerError> {
    let mut out = Vec::with_capacity(groups.len());
    for group in groups {
        match users::get_user(conn, group.target_id)? {
            Some(user) if user.role == UserRole::Host => out.push((group, user)),
            Some(_) => debug!(user_id = group.target_id, "dropping non-host"),
            None => debug!(user_id = group.target_id, "dropping missing host"),
        }
    }
    Ok(out)
}

pub fn filter_by_location(hosts: Vec<RatedHost>, needle: &str) -> Vec<RatedHost> {
    hosts
        .into_iter()
        .filter(|h| h.location.as_ref().is_some_and(|loc| loc.matches(needle)))
        .collect()
}
