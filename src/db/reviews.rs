// src/db/reviews.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::listing::Page;
use crate::domain::review::{RatingDistribution, RatingGroup, Review, ReviewedListing, TargetKind};
use crate::domain::user::OwnerSummary;
use crate::errors::ServerError;

/// Group stage of the top-rated pipeline: mean and count of ratings per
/// non-null target of the requested kind.
pub fn rating_groups(conn: &Connection, target: TargetKind) -> Result<Vec<RatingGroup>, ServerError> {
    let column = match target {
        TargetKind::Listing => "listing_id",
        TargetKind::Host => "host_id",
    };

    let mut stmt = conn
        .prepare(&format!(
            r#"
            SELECT {column}, AVG(rating), COUNT(*)
            FROM reviews
            WHERE {column} IS NOT NULL
            GROUP BY {column}
            "#
        ))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RatingGroup {
                target_id: row.get(0)?,
                average_rating: row.get(1)?,
                review_count: row.get(2)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut groups = Vec::new();
    for r in rows {
        groups.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(groups)
}

pub fn host_rating_distribution(
    conn: &Connection,
    host_id: i64,
) -> Result<RatingDistribution, ServerError> {
    let mut stmt = conn
        .prepare("SELECT rating, COUNT(*) FROM reviews WHERE host_id = ? GROUP BY rating")
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![host_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut dist = RatingDistribution::default();
    for r in rows {
        let (rating, n) = r.map_err(|e| ServerError::DbError(e.to_string()))?;
        dist.record(rating, n);
    }
    Ok(dist)
}

/// Columns read for every review, reviewer, host and listing joined. Keep in
/// step with `review_from_row`.
const REVIEW_SELECT: &str = r#"
    SELECT
        r.id,               -- 0
        r.host_id,          -- 1
        r.rating,           -- 2
        r.comment,          -- 3
        r.created_at,       -- 4

        u.id,               -- 5
        u.firstname,        -- 6
        u.lastname,         -- 7
        u.email,            -- 8
        u.role,             -- 9

        h.id,               -- 10
        h.firstname,        -- 11
        h.lastname,         -- 12
        h.email,            -- 13
        h.role,             -- 14

        l.id,               -- 15
        l.title,            -- 16
        l.kind              -- 17
    FROM reviews r
    LEFT JOIN users u ON u.id = r.reviewer_id
    LEFT JOIN users h ON h.id = r.host_id
    LEFT JOIN listings l ON l.id = r.listing_id
"#;

fn summary_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Option<OwnerSummary>> {
    match row.get::<_, Option<i64>>(at)? {
        Some(id) => Ok(Some(OwnerSummary {
            id,
            firstname: row.get(at + 1)?,
            lastname: row.get(at + 2)?,
            email: row.get(at + 3)?,
            role: row.get(at + 4)?,
        })),
        None => Ok(None),
    }
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let post = match row.get::<_, Option<i64>>(15)? {
        Some(id) => Some(ReviewedListing {
            id,
            title: row.get(16)?,
            kind: row.get(17)?,
        }),
        None => None,
    };

    Ok(Review {
        id: row.get(0)?,
        host_id: row.get(1)?,
        reviewer: summary_at(row, 5)?,
        host: summary_at(row, 10)?,
        post,
        rating: row.get(2)?,
        comment: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Whose reviews a page lists.
#[derive(Debug, Clone, Copy)]
enum ReviewOwner {
    /// Received by this host.
    Host(i64),
    /// Written by this user.
    Reviewer(i64),
}

impl ReviewOwner {
    fn column(&self) -> &'static str {
        match self {
            ReviewOwner::Host(_) => "r.host_id",
            ReviewOwner::Reviewer(_) => "r.reviewer_id",
        }
    }

    fn id(&self) -> i64 {
        match self {
            ReviewOwner::Host(id) | ReviewOwner::Reviewer(id) => *id,
        }
    }
}

/// Newest first, with an optional exact rating filter.
fn reviews_page(
    conn: &Connection,
    owner: ReviewOwner,
    rating: Option<i64>,
    page: Page,
) -> Result<(Vec<Review>, i64), ServerError> {
    let filter = format!("{} = ?1 AND (?2 IS NULL OR r.rating = ?2)", owner.column());

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM reviews r WHERE {filter}"),
            params![owner.id(), rating],
            |row| row.get(0),
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut stmt = conn
        .prepare(&format!(
            "{REVIEW_SELECT} WHERE {filter} ORDER BY r.created_at DESC, r.id DESC LIMIT ?3 OFFSET ?4"
        ))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(
            params![owner.id(), rating, page.sql_limit(), page.offset()],
            review_from_row,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut reviews = Vec::new();
    for r in rows {
        reviews.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok((reviews, total))
}

/// Reviews received by a host.
pub fn host_reviews_page(
    conn: &Connection,
    host_id: i64,
    rating: Option<i64>,
    page: Page,
) -> Result<(Vec<Review>, i64), ServerError> {
    reviews_page(conn, ReviewOwner::Host(host_id), rating, page)
}

/// Reviews written by a user.
pub fn reviewer_reviews_page(
    conn: &Connection,
    reviewer_id: i64,
    page: Page,
) -> Result<(Vec<Review>, i64), ServerError> {
    reviews_page(conn, ReviewOwner::Reviewer(reviewer_id), None, page)
}

pub fn get_review(conn: &Connection, id: i64) -> Result<Option<Review>, ServerError> {
    conn.query_row(
        &format!("{REVIEW_SELECT} WHERE r.id = ?"),
        params![id],
        review_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}
