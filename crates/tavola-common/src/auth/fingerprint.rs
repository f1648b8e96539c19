//! Device fingerprint derivation
//!
//! A fingerprint is a lowercase hex SHA-256 digest of client signals. It is
//! stored on the session and token family at login and compared on refresh;
//! a mismatch is suspicious but not proof of theft (mobile clients change
//! IP and user agent routinely), so callers log it rather than revoke.

use sha2::{Digest, Sha256};

/// Digest a set of client signals into a fingerprint.
///
/// Signals are joined with a separator before hashing so that
/// `["ab", "c"]` and `["a", "bc"]` produce different digests.
#[must_use]
pub fn digest_signals(signals: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, signal) in signals.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(signal.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Normalize a client-supplied fingerprint value.
///
/// Clients that compute their own digest send 64 hex characters, which pass
/// through unchanged (lowercased). Anything else is treated as raw signal
/// material and digested server-side, so arbitrary header values never land
/// in storage verbatim.
#[must_use]
pub fn normalize_fingerprint(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        trimmed.to_ascii_lowercase()
    } else {
        digest_signals(&[trimmed])
    }
}

/// Derive a fingerprint from request metadata.
///
/// Returns `None` when no signal is available, in which case fingerprint
/// comparison is skipped entirely for the session.
#[must_use]
pub fn fingerprint_from_request(
    device_header: Option<&str>,
    user_agent: Option<&str>,
    ip: Option<&str>,
) -> Option<String> {
    if let Some(value) = device_header {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(normalize_fingerprint(trimmed));
        }
    }

    match (user_agent, ip) {
        (None, None) => None,
        (ua, addr) => Some(digest_signals(&[ua.unwrap_or(""), addr.unwrap_or("")])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_and_hex() {
        let a = digest_signals(&["Mozilla/5.0", "10.0.0.1"]);
        let b = digest_signals(&["Mozilla/5.0", "10.0.0.1"]);

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_separates_signals() {
        assert_ne!(digest_signals(&["ab", "c"]), digest_signals(&["a", "bc"]));
    }

    #[test]
    fn test_normalize_passes_hex_digest_through() {
        let digest = digest_signals(&["some-device"]);
        assert_eq!(normalize_fingerprint(&digest), digest);

        let upper = digest.to_ascii_uppercase();
        assert_eq!(normalize_fingerprint(&upper), digest);
    }

    #[test]
    fn test_normalize_digests_raw_values() {
        let normalized = normalize_fingerprint("my phone model 12; build 9");
        assert_eq!(normalized.len(), 64);
        assert_ne!(normalized, "my phone model 12; build 9");
    }

    #[test]
    fn test_request_fingerprint_prefers_device_header() {
        let from_header = fingerprint_from_request(Some("device-abc"), Some("UA"), Some("1.2.3.4"));
        let from_signals = fingerprint_from_request(None, Some("UA"), Some("1.2.3.4"));

        assert_eq!(from_header, Some(normalize_fingerprint("device-abc")));
        assert_ne!(from_header, from_signals);
    }

    #[test]
    fn test_request_fingerprint_absent_without_signals() {
        assert_eq!(fingerprint_from_request(None, None, None), None);
        assert_eq!(fingerprint_from_request(Some("   "), None, None), None);
    }
}
