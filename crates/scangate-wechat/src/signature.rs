//! Server URL verification.
//!
//! WeChat signs every request to the server URL with
//! `sha1(sort([token, timestamp, nonce]).join(""))`, hex encoded, and
//! passes it as the `signature` query parameter. The token is the one
//! configured in the Official Account admin console.

use sha1::{Digest, Sha1};

/// Computes the signature WeChat would send for these values.
pub fn signature(token: &str, timestamp: &str, nonce: &str) -> String {
    let mut parts = [token, timestamp, nonce];
    parts.sort_unstable();

    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Returns `true` if `signature` matches the one computed from the token,
/// timestamp and nonce.
pub fn verify_signature(token: &str, timestamp: &str, nonce: &str, signature: &str) -> bool {
    let expected = self::signature(token, timestamp, nonce);
    expected.eq_ignore_ascii_case(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_order_independent() {
        let a = signature("token", "1700000000", "42");
        let b = signature("42", "token", "1700000000");

        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_matches_sorted_concatenation() {
        let mut hasher = Sha1::new();
        hasher.update(b"170000000042token");
        let expected = hex::encode(hasher.finalize());

        assert_eq!(signature("token", "1700000000", "42"), expected);
    }

    #[test]
    fn test_verify_signature_accepts_own_signature() {
        let sig = signature("token", "1700000000", "42");

        assert!(verify_signature("token", "1700000000", "42", &sig));
        assert!(verify_signature("token", "1700000000", "42", &sig.to_uppercase()));
    }

    #[test]
    fn test_verify_signature_rejects_wrong_token() {
        let sig = signature("token", "1700000000", "42");

        assert!(!verify_signature("other", "1700000000", "42", &sig));
        assert!(!verify_signature("token", "1700000001", "42", &sig));
        assert!(!verify_signature("token", "1700000000", "42", ""));
    }
}
