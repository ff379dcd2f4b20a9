pub mod model;
pub mod repository;

pub use model::ApprovalToken;
pub use repository::ApprovalTokenRepository;
