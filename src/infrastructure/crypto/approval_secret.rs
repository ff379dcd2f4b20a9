//! One-time approval secrets embedded in owner emails.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Bytes of entropy per secret.
const SECRET_BYTES: usize = 32;

/// Generate a random 256-bit secret, hex encoded.
pub fn generate_approval_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest stored in place of the secret.
pub fn hash_approval_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn secrets_are_distinct_and_full_length() {
        let secrets: HashSet<String> = (0..256).map(|_| generate_approval_secret()).collect();
        assert_eq!(secrets.len(), 256);
        assert!(secrets.iter().all(|s| s.len() == SECRET_BYTES * 2));
    }

    #[test]
    fn hash_is_stable_and_not_the_secret() {
        let secret = generate_approval_secret();
        assert_eq!(hash_approval_secret(&secret), hash_approval_secret(&secret));
        assert_ne!(hash_approval_secret(&secret), secret);
    }
}
