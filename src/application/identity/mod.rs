//! Identity module: registration, authentication and allow-list management
//!
//! Contains the `CredentialService`, which owns every use-case that reads or
//! writes accounts and pre-approval entries.

pub mod service;

pub use service::{AuthSession, CredentialService, OperatorCredential, RegisterCommand};
