// src/domain/rating.rs
//
// The in-process stages of the top-rated pipeline. Grouping happens in the
// store; everything between grouping and the target join lives here so each
// step can be exercised on its own.

use std::cmp::Ordering;

use crate::domain::review::RatingGroup;
use crate::errors::ServerError;

pub const DEFAULT_MIN_RATING: f64 = 0.0;
pub const DEFAULT_TOP_RATED_LIMIT: usize = 10;

pub fn validate_min_rating(min_rating: f64) -> Result<f64, ServerError> {
    if !min_rating.is_finite() || !(0.0..=5.0).contains(&min_rating) {
        return Err(ServerError::InvalidMinRating);
    }
    Ok(min_rating)
}

/// Positive, and small enough to bind as an SQLite integer.
pub fn validate_limit(limit: usize) -> Result<usize, ServerError> {
    if limit == 0 || i64::try_from(limit).is_err() {
        return Err(ServerError::InvalidLimit);
    }
    Ok(limit)
}

/// Drop groups whose unrounded mean is below `min_rating`.
pub fn threshold(groups: Vec<RatingGroup>, min_rating: f64) -> Vec<RatingGroup> {
    groups
        .into_iter()
        .filter(|g| g.average_rating >= min_rating)
        .collect()
}

/// Highest average first, then most reviews, then lowest id.
pub fn rank(groups: &mut [RatingGroup]) {
    groups.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.review_count.cmp(&a.review_count))
            .then_with(|| a.target_id.cmp(&b.target_id))
    });
}

pub fn cap(mut groups: Vec<RatingGroup>, limit: usize) -> Vec<RatingGroup> {
    groups.truncate(limit);
    groups
}

/// threshold -> rank -> cap
pub fn select_top(groups: Vec<RatingGroup>, min_rating: f64, limit: usize) -> Vec<RatingGroup> {
    let mut kept = threshold(groups, min_rating);
    rank(&mut kept);
    cap(kept, limit)
}
