// src/db/users.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::user::{User, UserLocation};
use crate::errors::ServerError;

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>, ServerError> {
    conn.query_row(
        r#"
        SELECT
            id, firstname, lastname, email, role, is_verified,
            city, state, country, latitude, longitude,
            created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
        params![user_id],
        |row| {
            let city: Option<String> = row.get(6)?;
            let state: Option<String> = row.get(7)?;
            let country: Option<String> = row.get(8)?;
            let latitude: Option<f64> = row.get(9)?;
            let longitude: Option<f64> = row.get(10)?;

            let has_location = city.is_some()
                || state.is_some()
                || country.is_some()
                || latitude.is_some()
                || longitude.is_some();

            Ok(User {
                id: row.get(0)?,
                firstname: row.get(1)?,
                lastname: row.get(2)?,
                email: row.get(3)?,
                role: row.get(4)?,
                is_verified: row.get(5)?,
                location: has_location.then_some(UserLocation {
                    city,
                    state,
                    country,
                    latitude,
                    longitude,
                }),
                created_at: row.get(11)?,
                updated_at: row.get(12)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("failed to load user: {e}")))
}
