pub mod listings;
pub mod nearby;
pub mod reviews;
pub mod top_rated;
