//! Domain layer: entities, lifecycle rules and repository contracts.

pub mod approval_token;
pub mod pre_approval;
pub mod repositories;
pub mod user;
pub mod visitor;

pub use approval_token::{ApprovalToken, ApprovalTokenRepository};
pub use pre_approval::{AddOutcome, AddStatus, PreApprovalEntry, PreApprovalKind, PreApprovalRepository};
pub use repositories::{DomainResult, RepositoryProvider};
pub use user::{Capability, Identity, NewUser, User, UserRepository, UserRole};
pub use visitor::{
    resolve_bike_number, Decision, DuplicateKey, NewVisitor, Visitor, VisitorDetails,
    VisitorFilter, VisitorRepository, VisitorStatus, NO_BIKE_NUMBER,
};

pub use crate::shared::errors::DomainError;
