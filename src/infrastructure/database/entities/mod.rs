//! Database entities module

pub mod approval_token;
pub mod pre_approval;
pub mod user;
pub mod visitor;

pub use approval_token::Entity as ApprovalToken;
pub use pre_approval::Entity as PreApproval;
pub use user::Entity as User;
pub use visitor::Entity as Visitor;
