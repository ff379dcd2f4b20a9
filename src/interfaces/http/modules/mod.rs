pub mod admin;
pub mod auth;
pub mod health;
pub mod metrics;
pub mod request_id;
pub mod visitors;
