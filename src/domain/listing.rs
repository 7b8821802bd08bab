// src/domain/listing.rs
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::geo::Coordinates;
use crate::domain::user::{OwnerSummary, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Experience,
    Service,
    Trek,
    Plan,
}

impl ListingKind {
    pub const ALL: [ListingKind; 4] = [
        ListingKind::Experience,
        ListingKind::Service,
        ListingKind::Trek,
        ListingKind::Plan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Experience => "experience",
            ListingKind::Service => "service",
            ListingKind::Trek => "trek",
            ListingKind::Plan => "plan",
        }
    }
}

impl FromStr for ListingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "experience" => Ok(ListingKind::Experience),
            "service" => Ok(ListingKind::Service),
            "trek" => Ok(ListingKind::Trek),
            "plan" => Ok(ListingKind::Plan),
            other => Err(format!("unknown listing kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Inactive,
    Pending,
    Archived,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Pending => "pending",
            ListingStatus::Archived => "archived",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ListingStatus::Active),
            "inactive" => Ok(ListingStatus::Inactive),
            "pending" => Ok(ListingStatus::Pending),
            "archived" => Ok(ListingStatus::Archived),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

sql_text_enum!(ListingKind);
sql_text_enum!(ListingStatus);
sql_text_enum!(UserRole);

/// A listing row as read from the store, with its owner already joined.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: i64,
    pub owner_id: i64,
    pub owner_role: UserRole,
    pub kind: ListingKind,
    pub title: String,
    pub description: String,

    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,

    pub price_per_person: Option<f64>,
    pub currency: String,

    pub duration_days: Option<i64>,
    pub duration_nights: Option<i64>,
    pub difficulty: Option<String>,
    pub categories: Vec<String>,

    pub is_featured: bool,
    pub status: ListingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,

    /// None when the owner row has gone missing.
    pub owner: Option<OwnerSummary>,
}

/// Shared filter vocabulary for every listing query.
#[derive(Debug, Clone, Default)]
pub struct ListingFilters {
    pub kind: Option<ListingKind>,
    pub owner_role: Option<UserRole>,
    /// Defaults to active when not given.
    pub status: Option<ListingStatus>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub difficulty: Option<String>,
    /// Any-of membership.
    pub categories: Vec<String>,
    pub is_featured: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    PricePerPerson,
    DurationDays,
    Difficulty,
    Title,
}

impl SortField {
    /// Unknown names fall back to newest-first ordering.
    pub fn from_param(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(SortField::CreatedAt),
            "price.perPerson" => Some(SortField::PricePerPerson),
            "duration.days" => Some(SortField::DurationDays),
            "difficulty" => Some(SortField::Difficulty),
            "title" => Some(SortField::Title),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "l.created_at",
            SortField::PricePerPerson => "l.price_per_person",
            SortField::DurationDays => "l.duration_days",
            SortField::Difficulty => "l.difficulty",
            SortField::Title => "l.title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSort {
    /// Featured first, then newest first.
    FeaturedThenNewest,
    NewestFirst,
    By { field: SortField, ascending: bool },
}

impl ListingSort {
    pub fn order_by(&self) -> String {
        match self {
            ListingSort::FeaturedThenNewest => "l.is_featured DESC, l.created_at DESC, l.id DESC".into(),
            ListingSort::NewestFirst => "l.created_at DESC, l.id DESC".into(),
            ListingSort::By { field, ascending } => {
                let dir = if *ascending { "ASC" } else { "DESC" };
                match field {
                    SortField::CreatedAt => format!("l.created_at {dir}, l.id {dir}"),
                    other => format!(
                        "{} {dir}, l.is_featured DESC, l.created_at DESC, l.id DESC",
                        other.column()
                    ),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Page {
    /// None for page or limit 0, or when the row offset or limit would not
    /// fit an SQLite integer.
    pub fn new(page: usize, limit: usize) -> Option<Self> {
        if page == 0 || limit == 0 {
            return None;
        }
        let offset = (page - 1).checked_mul(limit)?;
        i64::try_from(offset).ok()?;
        i64::try_from(limit).ok()?;
        Some(Self { page, limit })
    }

    pub fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }

    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .and_then(|offset| i64::try_from(offset).ok())
            .unwrap_or(i64::MAX)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        let total = u64::try_from(total).unwrap_or(0);
        let pages = total.div_ceil(self.limit.max(1) as u64);
        i64::try_from(pages).unwrap_or(i64::MAX)
    }
}

/// Post counts for one owner, used in host projections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostsByKind {
    pub trek: i64,
    pub service: i64,
    pub experience: i64,
    pub plan: i64,
}

impl PostsByKind {
    pub fn add(&mut self, kind: ListingKind, n: i64) {
        match kind {
            ListingKind::Trek => self.trek += n,
            ListingKind::Service => self.service += n,
            ListingKind::Experience => self.experience += n,
            ListingKind::Plan => self.plan += n,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerPostCounts {
    pub total: i64,
    pub active: i64,
    pub by_kind: PostsByKind,
}
