use chrono::{DateTime, Duration, Utc};

/// Stored form of an emailed approval secret.
///
/// Only the SHA-256 digest of the secret is kept; the plain value exists in
/// the outgoing email and nowhere else.
#[derive(Debug, Clone)]
pub struct ApprovalToken {
    pub id: String,
    pub token_hash: String,
    pub visitor_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalToken {
    pub fn new(token_hash: String, visitor_id: String, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token_hash,
            visitor_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_at_ttl() {
        let now = Utc::now();
        let token = ApprovalToken::new("h".into(), "v".into(), Duration::hours(24), now);
        assert!(!token.is_expired(now + Duration::hours(23)));
        assert!(token.is_expired(now + Duration::hours(24)));
    }
}
