//! Visitor module: gate submission, owner decision links, guard history

pub mod dto;
pub mod form;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
