// errors.rs
use astra::Response;
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, input validation, missing resources) or the store.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    /// A named resource addressed by id does not exist.
    #[error("{0} not found")]
    Missing(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid latitude or longitude values")]
    InvalidCoordinates,

    #[error("Invalid maxDistance value. Must be a positive number of meters")]
    InvalidRadius,

    #[error("Invalid minRating value. Must be between 0 and 5")]
    InvalidMinRating,

    #[error("Invalid limit value. Must be a positive number")]
    InvalidLimit,

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotFound | ServerError::Missing(_) => 404,
            ServerError::BadRequest(_)
            | ServerError::InvalidCoordinates
            | ServerError::InvalidRadius
            | ServerError::InvalidMinRating
            | ServerError::InvalidLimit => 400,
            ServerError::Config(_) | ServerError::DbError(_) | ServerError::InternalError => 500,
        }
    }

    /// Message safe to hand back to a client. Store failures are
    /// reported generically; the detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Config(_) | ServerError::DbError(_) | ServerError::InternalError => {
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}
