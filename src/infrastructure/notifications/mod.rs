//! Notification gateways
//!
//! SMTP delivery for production and a log-only gateway used when no mail
//! server is configured.

pub mod console;
pub mod smtp;
pub mod templates;

pub use console::LogNotificationGateway;
pub use smtp::{SmtpConfig, SmtpNotificationGateway};
