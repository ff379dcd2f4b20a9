pub mod model;
pub mod repository;

pub use model::{AddOutcome, AddStatus, PreApprovalEntry, PreApprovalKind};
pub use repository::PreApprovalRepository;
