//! Webhook signature verification
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends it as `X-Hub-Signature-256: sha256=<hex>`. Verification runs on the
//! exact bytes received, before any JSON parsing.

use crate::config::SyncConfig;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Check `signature_header` against the HMAC of `raw_body` under `secret`
///
/// Returns false for an empty secret, an empty body, a missing or malformed
/// header, or a digest mismatch. The digest comparison is constant-time.
pub fn verify(raw_body: &[u8], signature_header: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() || raw_body.is_empty() {
        return false;
    }

    let Some(hex_digest) = signature_header.and_then(|h| h.trim().strip_prefix(SIGNATURE_PREFIX))
    else {
        return false;
    };

    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Signature header value for `raw_body` under `secret`
pub fn sign(raw_body: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(raw_body);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Verifier bound to the configured shared secret
#[derive(Clone)]
pub struct SignatureGuard {
    secret: String,
}

impl SignatureGuard {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.webhook_secret.clone())
    }

    pub fn verify(&self, raw_body: &[u8], signature_header: Option<&str>) -> bool {
        verify(raw_body, signature_header, &self.secret)
    }
}

impl std::fmt::Debug for SignatureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureGuard")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"action":"closed","issue":{"id":42,"title":"Crash on load"}}"#;

    #[test]
    fn test_known_digest() {
        // Example from GitHub's webhook documentation
        let signature = sign(b"Hello, World!", "It's a Secret to Everybody");
        assert_eq!(
            signature,
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
        assert!(verify(b"Hello, World!", Some(&signature), "It's a Secret to Everybody"));
    }

    #[test]
    fn test_exact_signature_passes() {
        let signature = sign(BODY, "s3cret");
        assert!(verify(BODY, Some(&signature), "s3cret"));
    }

    #[test]
    fn test_mutated_body_fails() {
        let signature = sign(BODY, "s3cret");
        let mut tampered = BODY.to_vec();
        tampered[10] ^= 0x01;
        assert!(!verify(&tampered, Some(&signature), "s3cret"));

        let mut extended = BODY.to_vec();
        extended.push(b' ');
        assert!(!verify(&extended, Some(&signature), "s3cret"));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signature = sign(BODY, "s3cret");
        assert!(!verify(BODY, Some(&signature), "other"));
    }

    #[test]
    fn test_malformed_headers_fail() {
        let signature = sign(BODY, "s3cret");
        let bare_hex = signature.trim_start_matches(SIGNATURE_PREFIX);
        let sha1 = format!("sha1={}", bare_hex);
        let truncated = &signature[..signature.len() - 2];

        for header in [None, Some(""), Some(bare_hex), Some(sha1.as_str()), Some(truncated), Some("sha256=zz")] {
            assert!(!verify(BODY, header, "s3cret"), "accepted {header:?}");
        }
    }

    #[test]
    fn test_empty_secret_or_body_fails() {
        let signature = sign(BODY, "");
        assert!(!verify(BODY, Some(&signature), ""));

        let signature = sign(b"", "s3cret");
        assert!(!verify(b"", Some(&signature), "s3cret"));
    }

    #[test]
    fn test_guard_redacts_secret() {
        let guard = SignatureGuard::new("s3cret");
        assert!(!format!("{:?}", guard).contains("s3cret"));
        assert!(guard.verify(BODY, Some(&sign(BODY, "s3cret"))));
    }
}
