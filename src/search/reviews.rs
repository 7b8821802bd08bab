// src/search/reviews.rs
use crate::db::connection::Database;
use crate::db::reviews;
use crate::domain::listing::Page;
use crate::domain::review::Review;
use crate::errors::ServerError;
use crate::responses::assemble::{round2, HostReviewSummary};

#[derive(Debug, Clone)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: i64,
    pub page: usize,
    pub total_pages: i64,
}

/// Page of reviews a host received, with stats over all of their reviews.
pub fn host_review_summary(
    db: &Database,
    host_id: i64,
    rating: Option<i64>,
    page: Page,
) -> Result<HostReviewSummary, ServerError> {
    if let Some(r) = rating {
        if !(1..=5).contains(&r) {
            return Err(ServerError::BadRequest(
                "Invalid rating value. Must be between 1 and 5".into(),
            ));
        }
    }

    let (received, total, distribution) = db.with_conn(|conn| {
        let (received, total) = reviews::host_reviews_page(conn, host_id, rating, page)?;
        let distribution = reviews::host_rating_distribution(conn, host_id)?;
        Ok((received, total, distribution))
    })?;

    Ok(HostReviewSummary {
        success: true,
        count: received.len(),
        total,
        page: page.page,
        total_pages: page.total_pages(total),
        average_rating: round2(distribution.mean()),
        total_reviews: distribution.total(),
        rating_distribution: distribution.into(),
        reviews: received,
    })
}

/// Reviews a user has written, newest first.
pub fn reviewer_reviews(db: &Database, reviewer_id: i64, page: Page) -> Result<ReviewPage, ServerError> {
    let (written, total) = db.with_conn(|conn| reviews::reviewer_reviews_page(conn, reviewer_id, page))?;

    Ok(ReviewPage {
        reviews: written,
        total,
        page: page.page,
        total_pages: page.total_pages(total),
    })
}

pub fn get_review(db: &Database, id: i64) -> Result<Review, ServerError> {
    db.with_conn(|conn| reviews::get_review(conn, id))?
        .ok_or(ServerError::Missing("Review"))
}
