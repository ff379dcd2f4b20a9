//! Visitor lifecycle: submission, owner decisions and the guard's own list.

pub mod links;
pub mod service;

pub use links::PublicLinks;
pub use service::{LifecycleSettings, SubmitVisitor, VisitorLifecycleService};
