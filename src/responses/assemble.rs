// src/responses/assemble.rs
//
// Response-shaped records. Everything here is a pure transform of rows the
// store already returned.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::geo::{round1, Coordinates};
use crate::domain::listing::{Listing, ListingKind, ListingStatus, OwnerPostCounts, PostsByKind};
use crate::domain::review::{RatingDistribution, RatingGroup, Review};
use crate::domain::user::{OwnerSummary, User, UserLocation, UserRole};

pub const DISTANCE_UNIT: &str = "km";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// [longitude, latitude]
    pub coordinates: [f64; 2],
}

impl From<Coordinates> for GeoPoint {
    fn from(c: Coordinates) -> Self {
        Self {
            kind: "Point",
            coordinates: [c.longitude, c.latitude],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceView {
    pub per_person: Option<f64>,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationView {
    pub days: Option<i64>,
    pub nights: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub post_type: ListingKind,
    pub user_role: UserRole,
    pub location: LocationView,
    pub price: PriceView,
    pub duration: DurationView,
    pub difficulty: Option<String>,
    pub categories: Vec<String>,
    pub is_featured: bool,
    pub status: ListingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub user: Option<OwnerSummary>,
}

impl From<Listing> for ListingView {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            title: l.title,
            description: l.description,
            post_type: l.kind,
            user_role: l.owner_role,
            location: LocationView {
                city: l.city,
                state: l.state,
                country: l.country,
                coordinates: l.coordinates.map(GeoPoint::from),
            },
            price: PriceView {
                per_person: l.price_per_person,
                currency: l.currency,
            },
            duration: DurationView {
                days: l.duration_days,
                nights: l.duration_nights,
            },
            difficulty: l.difficulty,
            categories: l.categories,
            is_featured: l.is_featured,
            status: l.status,
            created_at: l.created_at,
            updated_at: l.updated_at,
            user: l.owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyListing {
    #[serde(flatten)]
    pub listing: ListingView,
    pub distance: f64,
    pub distance_unit: &'static str,
}

/// Attach the display distance, recomputed with Haversine from the origin.
/// Returns None for a listing without coordinates.
pub fn nearby_listing(origin: &Coordinates, listing: Listing) -> Option<NearbyListing> {
    let coords = listing.coordinates?;
    let distance = round1(origin.distance_km(&coords));
    Some(NearbyListing {
        listing: listing.into(),
        distance,
        distance_unit: DISTANCE_UNIT,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedListing {
    #[serde(flatten)]
    pub listing: ListingView,
    pub average_rating: f64,
    pub review_count: i64,
}

pub fn rated_listing(group: &RatingGroup, listing: Listing) -> RatedListing {
    RatedListing {
        listing: listing.into(),
        average_rating: round1(group.average_rating),
        review_count: group.review_count,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedHost {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub location: Option<UserLocation>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub average_rating: f64,
    pub review_count: i64,
    pub total_posts: i64,
    pub active_posts: i64,
    pub posts_by_type: PostsByKind,
}

pub fn rated_host(group: &RatingGroup, user: User, posts: OwnerPostCounts) -> RatedHost {
    RatedHost {
        id: user.id,
        firstname: user.firstname,
        lastname: user.lastname,
        email: user.email,
        role: user.role,
        is_verified: user.is_verified,
        location: user.location,
        created_at: user.created_at,
        updated_at: user.updated_at,
        average_rating: round1(group.average_rating),
        review_count: group.review_count,
        total_posts: posts.total,
        active_posts: posts.active,
        posts_by_type: posts.by_kind,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingDistributionView {
    #[serde(rename = "1")]
    pub one: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "5")]
    pub five: i64,
}

impl From<RatingDistribution> for RatingDistributionView {
    fn from(d: RatingDistribution) -> Self {
        let [one, two, three, four, five] = d.0;
        Self {
            one,
            two,
            three,
            four,
            five,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReviewSummary {
    pub success: bool,
    pub count: usize,
    pub total: i64,
    pub page: usize,
    pub total_pages: i64,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub rating_distribution: RatingDistributionView,
    pub reviews: Vec<Review>,
}

/// Two decimals, as shown on a host's review page.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
