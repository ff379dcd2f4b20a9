//! JWT session tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::{Identity, UserRole};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl JwtConfig {
    pub const ISSUER: &'static str = "visitor-gate";

    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
            issuer: Self::ISSUER.to_string(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    /// Role name as stored (`admin`, `security`, `super_admin`)
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl TokenClaims {
    pub fn new(identity: &Identity, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }
}

impl TokenClaims {
    /// Rebuild the identity carried by a verified token.
    pub fn identity(&self) -> Option<Identity> {
        Some(Identity {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: UserRole::parse(&self.role)?,
        })
    }
}

/// Create a signed session token for an identity
pub fn create_token(
    identity: &Identity,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(identity, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, issuer and expiry, and decode the claims
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    fn identity() -> Identity {
        Identity {
            id: "u-1".into(),
            name: "Guard".into(),
            email: "guard@example.com".into(),
            role: UserRole::Security,
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let config = JwtConfig::new("test-secret", 1);
        let token = create_token(&identity(), &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, "security");
        assert_eq!(claims.iss, JwtConfig::ISSUER);
        assert_eq!(claims.identity(), Some(identity()));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(&identity(), &JwtConfig::new("a", 1)).unwrap();
        assert!(verify_token(&token, &JwtConfig::new("b", 1)).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = JwtConfig::new("test-secret", -2);
        let token = create_token(&identity(), &config).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }
}
