// src/params.rs
use astra::Request;
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::listing::{ListingFilters, ListingKind, ListingStatus};
use crate::domain::user::UserRole;
use crate::errors::ServerError;

/// Decoded query string. Empty values count as absent.
#[derive(Debug, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn from_request(req: &Request) -> Self {
        Self::parse(req.uri().query().unwrap_or(""))
    }

    pub fn parse(query: &str) -> Self {
        let map = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Parse a present value, mapping any parse failure to `err`.
    pub fn parse_with<T: FromStr>(
        &self,
        key: &str,
        err: impl FnOnce() -> ServerError,
    ) -> Result<Option<T>, ServerError> {
        match self.get(key) {
            Some(raw) => raw.parse().map(Some).map_err(|_| err()),
            None => Ok(None),
        }
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, ServerError> {
        self.parse_with(key, || invalid(key))
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, ServerError> {
        self.parse_with(key, || invalid(key))
    }

    pub fn limit(&self) -> Result<Option<usize>, ServerError> {
        self.parse_with("limit", || ServerError::InvalidLimit)
    }

    pub fn page(&self) -> Result<Option<usize>, ServerError> {
        self.parse_with("page", || invalid("page"))
    }

    pub fn min_rating(&self) -> Result<Option<f64>, ServerError> {
        self.parse_with("minRating", || ServerError::InvalidMinRating)
    }

    /// Comma-separated list.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Anything other than "true" is false.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v == "true")
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Filters shared by the listing endpoints.
    pub fn listing_filters(&self) -> Result<ListingFilters, ServerError> {
        Ok(ListingFilters {
            kind: self.parse_with::<ListingKind>("postType", || invalid("postType"))?,
            owner_role: self.parse_with::<UserRole>("userRole", || invalid("userRole"))?,
            status: self.parse_with::<ListingStatus>("status", || invalid("status"))?,
            city: self.string("city"),
            state: self.string("state"),
            country: self.string("country"),
            difficulty: self.string("difficulty"),
            categories: self.list("categories"),
            is_featured: self.flag("isFeatured"),
            min_price: self.number("minPrice")?,
            max_price: self.number("maxPrice")?,
            min_days: self.integer("minDays")?,
            max_days: self.integer("maxDays")?,
        })
    }

    /// The narrower vocabulary of the proximity search. Other listing
    /// params are ignored rather than validated.
    pub fn nearby_filters(&self) -> Result<ListingFilters, ServerError> {
        Ok(ListingFilters {
            difficulty: self.string("difficulty"),
            categories: self.list("categories"),
            min_price: self.number("minPrice")?,
            max_price: self.number("maxPrice")?,
            ..ListingFilters::default()
        })
    }
}

fn invalid(key: &str) -> ServerError {
    ServerError::BadRequest(format!("Invalid {key} value"))
}
