//! Visitor aggregate
//!
//! A visitor record starts `pending` and is resolved exactly once by the
//! flat owner, either to `approved` or to `rejected`.

pub mod model;
pub mod repository;

pub use model::{
    resolve_bike_number, Decision, DuplicateKey, NewVisitor, Visitor, VisitorDetails,
    VisitorFilter, VisitorStatus, NO_BIKE_NUMBER,
};
pub use repository::VisitorRepository;
