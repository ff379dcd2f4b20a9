//! Admin module: dashboard, visitor log, export, allow-lists

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
