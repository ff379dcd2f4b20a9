//! User aggregate
//!
//! Accounts, roles and the capability set each role carries.

pub mod model;
pub mod repository;

pub use model::{Capability, Identity, NewUser, User, UserRole};
pub use repository::UserRepository;
