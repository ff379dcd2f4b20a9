//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod notifications;
pub mod recognition;
pub mod storage;
pub mod uploads;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use notifications::{LogNotificationGateway, SmtpConfig, SmtpNotificationGateway};
pub use recognition::HttpPlateRecognizer;
pub use storage::InMemoryRepositoryProvider;
pub use uploads::LocalImageStore;
