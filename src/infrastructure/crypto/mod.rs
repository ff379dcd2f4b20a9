//! Credential primitives: session tokens, password hashes, approval secrets.

pub mod approval_secret;
pub mod jwt;
pub mod password;

pub use approval_secret::{generate_approval_secret, hash_approval_secret};
pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use password::{hash_password, verify_password};
