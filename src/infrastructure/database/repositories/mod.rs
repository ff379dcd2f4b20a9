//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod approval_token_repository;
pub mod pre_approval_repository;
pub mod repository_provider;
pub mod user_repository;
pub mod visitor_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
