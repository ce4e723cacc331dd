//! # Resource Naming
//!
//! Deterministic, length-bounded names for backend resources.
//!
//! Keys are sanitized to the DNS-1123 label alphabet. Keys that still exceed
//! the limit keep a readable prefix and get a fixed-width suffix hashed from
//! the full original key, so two long keys that share a prefix past the
//! limit still produce different names.
//!
//! ```rust
//! use build_controller::controller::dataplane::naming::generate_k8s_name_with_length_limit;
//!
//! assert_eq!(
//!     generate_k8s_name_with_length_limit(63, &["Acme", "Web_App"]),
//!     "acme-web-app"
//! );
//! ```

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Width of the hex hash suffix appended to truncated names
pub const HASH_LEN: usize = 8;

static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9-]")
        .expect("Failed to compile INVALID_CHARS regex - this should never happen")
});

static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-{2,}").expect("Failed to compile DASH_RUNS regex - this should never happen")
});

static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$")
        .expect("Failed to compile DNS_LABEL regex - this should never happen")
});

/// Lowercase and map every character outside `[a-z0-9-]` to `-`,
/// collapsing dash runs and trimming dashes at both ends
#[must_use]
pub fn sanitize_name(key: &str) -> String {
    let lowered = key.to_lowercase();
    let replaced = INVALID_CHARS.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// First `width` hex characters of the key's SHA-256, at most [`HASH_LEN`]
fn short_hash(key: &str, width: usize) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{digest:x}");
    hex[..width.min(HASH_LEN)].to_string()
}

/// Join `parts` with `-`, sanitize, and bound the result to `limit` characters
///
/// Names that fit are returned unchanged after sanitizing. Longer names keep a
/// prefix of `limit - 1 - HASH_LEN` characters and end in `-<hash>`, where the
/// hash covers the joined key before sanitizing or truncation. When there is
/// no room for a prefix the name is the hash alone, cut to `limit`.
#[must_use]
pub fn generate_k8s_name_with_length_limit(limit: usize, parts: &[&str]) -> String {
    let key = parts.join("-");
    let sanitized = sanitize_name(&key);
    if sanitized.is_empty() {
        return short_hash(&key, limit);
    }
    if sanitized.len() <= limit {
        return sanitized;
    }

    // Sanitized output is ASCII, so byte slicing is char-aligned.
    let prefix_len = limit.saturating_sub(HASH_LEN + 1);
    let prefix = sanitized[..prefix_len].trim_end_matches('-');
    if prefix.is_empty() {
        return short_hash(&key, limit);
    }
    format!("{}-{}", prefix, short_hash(&key, HASH_LEN))
}

/// [`generate_k8s_name_with_length_limit`] bounded to the 63 character label limit
#[must_use]
pub fn generate_k8s_name(parts: &[&str]) -> String {
    generate_k8s_name_with_length_limit(crate::constants::MAX_RESOURCE_NAME_LENGTH, parts)
}

/// Whether `name` is a valid DNS-1123 label
#[must_use]
pub fn is_valid_k8s_name(name: &str) -> bool {
    name.len() <= crate::constants::MAX_RESOURCE_NAME_LENGTH && DNS_LABEL.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My_Build.v1"), "my-build-v1");
        assert_eq!(sanitize_name("--a__b--"), "a-b");
        assert_eq!(sanitize_name("UPPER"), "upper");
        assert_eq!(sanitize_name("___"), "");
    }

    #[test]
    fn test_short_names_are_not_hashed() {
        let name = generate_k8s_name(&["default-org", "library", "reading-list", "main"]);
        assert_eq!(name, "default-org-library-reading-list-main");
    }

    #[test]
    fn test_name_is_deterministic() {
        let key = "a".repeat(100);
        assert_eq!(
            generate_k8s_name_with_length_limit(63, &[&key]),
            generate_k8s_name_with_length_limit(63, &[&key])
        );
    }

    #[test]
    fn test_shared_prefix_past_limit_yields_distinct_names() {
        let base = "reading-list-service-".repeat(4);
        let a = format!("{base}build-1");
        let b = format!("{base}build-2");

        let name_a = generate_k8s_name_with_length_limit(63, &[&a]);
        let name_b = generate_k8s_name_with_length_limit(63, &[&b]);

        assert_ne!(name_a, name_b);
        assert!(name_a.len() <= 63);
        assert!(name_b.len() <= 63);
        assert!(is_valid_k8s_name(&name_a));
        assert!(is_valid_k8s_name(&name_b));
    }

    #[test]
    fn test_truncated_name_keeps_readable_prefix() {
        let key = "x".repeat(80);
        let name = generate_k8s_name_with_length_limit(20, &[&key]);
        assert_eq!(name.len(), 20);
        assert!(name.starts_with("xxxxxxxxxxx-"));
    }

    #[test]
    fn test_trailing_dash_trimmed_before_suffix() {
        // Prefix cut lands right after a dash
        let key = format!("{}-{}", "a".repeat(10), "b".repeat(40));
        let name = generate_k8s_name_with_length_limit(20, &[&key]);
        assert!(!name.contains("--"));
        assert!(is_valid_k8s_name(&name));
    }

    #[test]
    fn test_empty_key_yields_hash() {
        let name = generate_k8s_name(&["___"]);
        assert_eq!(name.len(), HASH_LEN);
        assert!(is_valid_k8s_name(&name));
    }

    #[test]
    fn test_limit_shorter_than_hash_is_respected() {
        for limit in 1..=HASH_LEN + 1 {
            let name = generate_k8s_name_with_length_limit(limit, &["abcdefghij"]);
            assert_eq!(name.len(), limit.min(HASH_LEN), "limit {limit}");
            assert!(is_valid_k8s_name(&name), "{name}");

            let empty_key = generate_k8s_name_with_length_limit(limit, &["___"]);
            assert!(empty_key.len() <= limit, "limit {limit}");
        }
        // A narrower limit cuts the same hash
        let full = generate_k8s_name_with_length_limit(HASH_LEN, &["abcdefghij"]);
        assert!(full.starts_with(&generate_k8s_name_with_length_limit(5, &["abcdefghij"])));
    }

    #[test]
    fn test_is_valid_k8s_name() {
        assert!(is_valid_k8s_name("choreo-ci-default-org"));
        assert!(!is_valid_k8s_name("-leading"));
        assert!(!is_valid_k8s_name("Upper"));
        assert!(!is_valid_k8s_name(&"a".repeat(64)));
    }
}
