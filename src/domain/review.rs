// src/domain/review.rs
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::listing::ListingKind;
use crate::domain::user::OwnerSummary;

/// What a group of reviews is aggregated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Reviews that name a specific listing.
    Listing,
    /// Every review, keyed by the host being rated.
    Host,
}

/// Mean and count of the reviews sharing one target id.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingGroup {
    pub target_id: i64,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewedListing {
    pub id: i64,
    pub title: String,
    #[serde(rename = "postType")]
    pub kind: ListingKind,
}

/// A review with its reviewer, host and listing joined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub host_id: i64,
    pub reviewer: Option<OwnerSummary>,
    pub host: Option<OwnerSummary>,
    pub post: Option<ReviewedListing>,
    pub rating: i64,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

/// Count of reviews per star value, index 0 holding one-star reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDistribution(pub [i64; 5]);

impl RatingDistribution {
    pub fn record(&mut self, rating: i64, n: i64) {
        if (1..=5).contains(&rating) {
            self.0[(rating - 1) as usize] += n;
        }
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let sum: i64 = self
            .0
            .iter()
            .enumerate()
            .map(|(i, n)| (i as i64 + 1) * n)
            .sum();
        sum as f64 / total as f64
    }
}
