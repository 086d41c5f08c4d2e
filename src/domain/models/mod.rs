pub mod auth;
pub mod booking;
pub mod job;
pub mod listing;
pub mod user;
