pub mod geo;
pub mod listing;
pub mod rating;
pub mod review;
pub mod user;
