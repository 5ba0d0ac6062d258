//! Telemetry sanitization - nothing personally identifying leaves the process
//!
//! Three rules, applied to every event before delivery:
//! 1. Free-text fields are dropped entirely, never redacted in place.
//! 2. User identifiers are rehashed into an opaque pseudonymous token.
//! 3. Contact-like fields are removed from nested objects.
//!
//! The rules run over the serialized event rather than the typed struct,
//! so a field added to a payload later is scrubbed without anyone
//! remembering to update this module.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex digits of the identity digest kept in the token.
const TOKEN_DIGEST_LEN: usize = 16;

/// Keys that may carry free text. Dropped wholesale.
const FREE_TEXT_KEYS: &[&str] = &[
    "note", "notes", "text", "transcript", "content", "message", "body", "raw",
];

/// Exact key names treated as contact data wherever they appear.
const CONTACT_NAME_KEYS: &[&str] = &["name", "first_name", "last_name", "full_name", "username"];

// Substring classes; key names are matched lowercased.
#[allow(clippy::expect_used)]
fn contact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(email|phone|address|contact)").expect("static pattern"))
}

#[allow(clippy::expect_used)]
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^anon-[0-9a-f]{16}$").expect("static pattern"))
}

/// Rehash a user identifier into an opaque pseudonymous token.
///
/// Stable per user so events from one user still correlate, but the
/// identifier itself (often an email address) never appears.
pub fn pseudonymize_user_id(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    let mut hex = String::with_capacity(TOKEN_DIGEST_LEN);
    for byte in digest.iter().take(TOKEN_DIGEST_LEN / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    format!("anon-{}", hex)
}

/// Whether `value` has the shape of a pseudonymous token.
pub fn is_pseudonymous_token(value: &str) -> bool {
    token_pattern().is_match(value)
}

fn key_is_free_text(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    FREE_TEXT_KEYS.contains(&key.as_str())
}

fn key_is_contact_like(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    CONTACT_NAME_KEYS.contains(&key.as_str()) || contact_pattern().is_match(&key)
}

/// Scrub a serialized metadata tree in place.
///
/// Applies the free-text and contact rules recursively; arrays are
/// walked element by element.
pub fn scrub_metadata(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key_is_free_text(key) && !key_is_contact_like(key));
            for nested in map.values_mut() {
                scrub_metadata(nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                scrub_metadata(item);
            }
        }
        _ => {}
    }
}
