use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::domain::geo::{BoundingBox, Coordinates};
use crate::domain::listing::{
    Listing, ListingFilters, ListingKind, ListingSort, ListingStatus, OwnerPostCounts, Page,
};
use crate::domain::user::OwnerSummary;
use crate::errors::ServerError;

/// Columns read for every listing, owner joined. Keep in step with
/// `listing_from_row`.
const LISTING_SELECT: &str = r#"
    SELECT
        l.id,                   -- 0
        l.owner_id,             -- 1
        l.owner_role,           -- 2
        l.kind,                 -- 3
        l.title,                -- 4
        l.description,          -- 5

        l.city,                 -- 6
        l.state,                -- 7
        l.country,              -- 8
        l.latitude,             -- 9
        l.longitude,            -- 10

        l.price_per_person,     -- 11
        l.currency,             -- 12
        l.duration_days,        -- 13
        l.duration_nights,      -- 14
        l.difficulty,           -- 15
        (SELECT group_concat(c.category, ',')
           FROM (SELECT category FROM listing_categories
                  WHERE listing_id = l.id ORDER BY category) c), -- 16

        l.is_featured,          -- 17
        l.status,               -- 18
        l.created_at,           -- 19
        l.updated_at,           -- 20

        u.id,                   -- 21
        u.firstname,            -- 22
        u.lastname,             -- 23
        u.email,                -- 24
        u.role                  -- 25
    FROM listings l
    LEFT JOIN users u ON u.id = l.owner_id
"#;

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    let latitude: Option<f64> = row.get(9)?;
    let longitude: Option<f64> = row.get(10)?;
    let coordinates = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let categories: Option<String> = row.get(16)?;
    let categories = categories
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default();

    let owner = match row.get::<_, Option<i64>>(21)? {
        Some(id) => Some(OwnerSummary {
            id,
            firstname: row.get(22)?,
            lastname: row.get(23)?,
            email: row.get(24)?,
            role: row.get(25)?,
        }),
        None => None,
    };

    Ok(Listing {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_role: row.get(2)?,
        kind: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,

        city: row.get(6)?,
        state: row.get(7)?,
        country: row.get(8)?,
        coordinates,

        price_per_person: row.get(11)?,
        currency: row.get(12)?,
        duration_days: row.get(13)?,
        duration_nights: row.get(14)?,
        difficulty: row.get(15)?,
        categories,

        is_featured: row.get(17)?,
        status: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,

        owner,
    })
}

/// Accumulates WHERE clauses and their positional parameters in textual order.
#[derive(Default)]
struct WhereBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl WhereBuilder {
    fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    fn apply_filters(&mut self, filters: &ListingFilters) {
        if let Some(kind) = filters.kind {
            self.push("l.kind = ?", [Value::from(kind.as_str().to_string())]);
        }
        if let Some(role) = filters.owner_role {
            self.push("l.owner_role = ?", [Value::from(role.as_str().to_string())]);
        }
        let status = filters.status.unwrap_or(ListingStatus::Active);
        self.push("l.status = ?", [Value::from(status.as_str().to_string())]);

        for (column, needle) in [
            ("l.city", &filters.city),
            ("l.state", &filters.state),
            ("l.country", &filters.country),
        ] {
            if let Some(needle) = needle {
                self.push(
                    format!("instr(lower({column}), lower(?)) > 0"),
                    [Value::from(needle.clone())],
                );
            }
        }

        if let Some(difficulty) = &filters.difficulty {
            self.push("l.difficulty = ?", [Value::from(difficulty.clone())]);
        }

        if !filters.categories.is_empty() {
            let marks = vec!["?"; filters.categories.len()].join(", ");
            self.push(
                format!(
                    "EXISTS (SELECT 1 FROM listing_categories c \
                     WHERE c.listing_id = l.id AND c.category IN ({marks}))"
                ),
                filters.categories.iter().cloned().map(Value::from),
            );
        }

        if let Some(featured) = filters.is_featured {
            self.push("l.is_featured = ?", [Value::from(featured as i64)]);
        }
        if let Some(min) = filters.min_price {
            self.push("l.price_per_person >= ?", [Value::from(min)]);
        }
        if let Some(max) = filters.max_price {
            self.push("l.price_per_person <= ?", [Value::from(max)]);
        }
        if let Some(min) = filters.min_days {
            self.push("l.duration_days >= ?", [Value::from(min)]);
        }
        if let Some(max) = filters.max_days {
            self.push("l.duration_days <= ?", [Value::from(max)]);
        }
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn collect_listings(
    conn: &Connection,
    sql: &str,
    params: Vec<Value>,
) -> Result<Vec<Listing>, ServerError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params_from_iter(params), listing_from_row)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Filtered, sorted page of listings plus the total number of matches.
pub fn search_listings(
    conn: &Connection,
    filters: &ListingFilters,
    sort: ListingSort,
    page: Page,
) -> Result<(Vec<Listing>, i64), ServerError> {
    let mut wb = WhereBuilder::default();
    wb.apply_filters(filters);
    let where_sql = wb.sql();

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM listings l {where_sql}"),
            params_from_iter(wb.params.iter()),
            |row| row.get(0),
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let sql = format!(
        "{LISTING_SELECT} {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        sort.order_by()
    );
    let mut params = wb.params;
    params.push(Value::from(page.sql_limit()));
    params.push(Value::from(page.offset()));

    let listings = collect_listings(conn, &sql, params)?;
    Ok((listings, total))
}

/// A listing found by the proximity query, with the store's own distance.
#[derive(Debug, Clone)]
pub struct NearbyRow {
    pub listing: Listing,
    pub store_distance_m: f64,
}

/// Store stage of the proximity search: bounding-box prefilter on the
/// indexed coordinate columns, exact radius bound, nearest first.
pub fn find_nearby(
    conn: &Connection,
    origin: Coordinates,
    max_distance_m: f64,
    filters: &ListingFilters,
    limit: usize,
) -> Result<Vec<NearbyRow>, ServerError> {
    let bbox = BoundingBox::around(origin.latitude, origin.longitude, max_distance_m / 1000.0);
    let distance_expr = "geo_distance_m(?, ?, l.latitude, l.longitude)";

    let mut wb = WhereBuilder::default();
    wb.apply_filters(filters);
    wb.push(
        "l.latitude IS NOT NULL AND l.longitude IS NOT NULL",
        std::iter::empty(),
    );
    wb.push(
        "l.latitude BETWEEN ? AND ? AND l.longitude BETWEEN ? AND ?",
        [
            Value::from(bbox.min_lat),
            Value::from(bbox.max_lat),
            Value::from(bbox.min_lon),
            Value::from(bbox.max_lon),
        ],
    );
    wb.push(
        format!("{distance_expr} <= ?"),
        [
            Value::from(origin.latitude),
            Value::from(origin.longitude),
            Value::from(max_distance_m),
        ],
    );

    let select = LISTING_SELECT.replacen(
        "FROM listings l",
        &format!(", {distance_expr} AS store_distance_m\n    FROM listings l"),
        1,
    );
    let sql = format!(
        "{select} {} ORDER BY store_distance_m ASC, l.id ASC LIMIT ?",
        wb.sql()
    );

    let mut params = vec![Value::from(origin.latitude), Value::from(origin.longitude)];
    params.extend(wb.params);
    params.push(Value::from(i64::try_from(limit).unwrap_or(i64::MAX)));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            Ok(NearbyRow {
                listing: listing_from_row(row)?,
                store_distance_m: row.get(26)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

pub fn get_listing(conn: &Connection, id: i64) -> Result<Option<Listing>, ServerError> {
    conn.query_row(
        &format!("{LISTING_SELECT} WHERE l.id = ?"),
        params![id],
        listing_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Every listing an owner has posted, any status, newest first.
pub fn listings_for_owner(conn: &Connection, owner_id: i64) -> Result<Vec<Listing>, ServerError> {
    let sql = format!("{LISTING_SELECT} WHERE l.owner_id = ? ORDER BY l.created_at DESC, l.id DESC");
    collect_listings(conn, &sql, vec![Value::from(owner_id)])
}

/// Total, active and per-kind post counts for one owner.
pub fn post_counts_for_owner(
    conn: &Connection,
    owner_id: i64,
) -> Result<OwnerPostCounts, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT kind, COUNT(*), SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END)
            FROM listings
            WHERE owner_id = ?
            GROUP BY kind
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![owner_id], |row| {
            Ok((
                row.get::<_, ListingKind>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut counts = OwnerPostCounts::default();
    for r in rows {
        let (kind, total, active) = r.map_err(|e| ServerError::DbError(e.to_string()))?;
        counts.total += total;
        counts.active += active;
        counts.by_kind.add(kind, total);
    }
    Ok(counts)
}
