// src/search/listings.rs
use crate::db::connection::Database;
use crate::db::listings;
use crate::domain::listing::{
    ListingFilters, ListingKind, ListingSort, ListingStatus, Page, SortField,
};
use crate::domain::rating::validate_limit;
use crate::errors::ServerError;
use crate::responses::assemble::ListingView;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const DEFAULT_FEATURED_LIMIT: usize = 20;
pub const DEFAULT_ALL_TREKS_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct ListingPage {
    pub listings: Vec<ListingView>,
    pub total: i64,
    pub page: usize,
    pub total_pages: i64,
}

pub fn page(page: Option<usize>, limit: Option<usize>) -> Result<Page, ServerError> {
    let limit = validate_limit(limit.unwrap_or(DEFAULT_PAGE_LIMIT))?;
    Page::new(page.unwrap_or(1), limit).ok_or_else(|| {
        ServerError::BadRequest("Invalid page value. Must be a positive number".into())
    })
}

/// Generic filtered listing search, featured first then newest.
pub fn search_listings(
    db: &Database,
    filters: &ListingFilters,
    page: Page,
) -> Result<ListingPage, ServerError> {
    run(db, filters, ListingSort::FeaturedThenNewest, page)
}

/// Trek search with an optional sort field (default createdAt). Unknown
/// fields sort newest first regardless of `ascending`.
pub fn search_treks(
    db: &Database,
    filters: &ListingFilters,
    sort_by: Option<&str>,
    ascending: bool,
    page: Page,
) -> Result<ListingPage, ServerError> {
    let filters = ListingFilters {
        kind: Some(ListingKind::Trek),
        status: Some(ListingStatus::Active),
        ..filters.clone()
    };

    let sort = match sort_by.map(SortField::from_param) {
        None => ListingSort::By {
            field: SortField::CreatedAt,
            ascending,
        },
        Some(Some(field)) => ListingSort::By { field, ascending },
        Some(None) => ListingSort::NewestFirst,
    };

    run(db, &filters, sort, page)
}

/// Active featured treks, newest first.
pub fn featured_treks(db: &Database, limit: usize) -> Result<Vec<ListingView>, ServerError> {
    let filters = ListingFilters {
        kind: Some(ListingKind::Trek),
        is_featured: Some(true),
        ..ListingFilters::default()
    };
    let page = Page::new(1, validate_limit(limit)?).ok_or(ServerError::InvalidLimit)?;
    Ok(run(db, &filters, ListingSort::NewestFirst, page)?.listings)
}

/// Every active trek, featured first then newest, unfiltered.
pub fn all_treks(db: &Database, page: Page) -> Result<ListingPage, ServerError> {
    let filters = ListingFilters {
        kind: Some(ListingKind::Trek),
        ..ListingFilters::default()
    };
    run(db, &filters, ListingSort::FeaturedThenNewest, page)
}

pub fn get_listing(db: &Database, id: i64) -> Result<ListingView, ServerError> {
    db.with_conn(|conn| listings::get_listing(conn, id))?
        .map(ListingView::from)
        .ok_or(ServerError::Missing("Post"))
}

/// A single trek of any status. Other kinds count as missing.
pub fn get_trek(db: &Database, id: i64) -> Result<ListingView, ServerError> {
    db.with_conn(|conn| listings::get_listing(conn, id))?
        .filter(|listing| listing.kind == ListingKind::Trek)
        .map(ListingView::from)
        .ok_or(ServerError::Missing("Trek"))
}

/// Everything a user has posted, newest first.
pub fn posts_by_owner(db: &Database, owner_id: i64) -> Result<Vec<ListingView>, ServerError> {
    let rows = db.with_conn(|conn| listings::listings_for_owner(conn, owner_id))?;
    Ok(rows.into_iter().map(ListingView::from).collect())
}

fn run(
    db: &Database,
    filters: &ListingFilters,
    sort: ListingSort,
    page: Page,
) -> Result<ListingPage, ServerError> {
    let (rows, total) = db.with_conn(|conn| listings::search_listings(conn, filters, sort, page))?;
    Ok(ListingPage {
        listings: rows.into_iter().map(ListingView::from).collect(),
        total,
        page: page.page,
        total_pages: page.total_pages(total),
    })
}
