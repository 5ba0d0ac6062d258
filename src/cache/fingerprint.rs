//! Deterministic cache keys derived from user, content, and domain
//!
//! Key format: `{domain}/{user_digest}/{content_digest}`
//!
//! The leading domain segment keeps per-domain prefix scans cheap and
//! guarantees that requests from different feature areas never collide.

use sha2::{Digest, Sha256};

use crate::types::{AnalysisContent, SourceDomain};

/// Hex digits kept from each SHA-256 digest. 64 bits per segment is
/// plenty for a per-user cache namespace.
const DIGEST_PREFIX_LEN: usize = 16;

fn short_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(DIGEST_PREFIX_LEN);
    for byte in digest.iter().take(DIGEST_PREFIX_LEN / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Compute the cache key for one request.
///
/// Identical repeated requests collide deterministically; different
/// users, domains, or payloads never share a key. The content digest is
/// taken over the canonical JSON encoding of the tagged content union,
/// so field order cannot perturb the key.
pub fn fingerprint(user_id: &str, content: &AnalysisContent, domain: SourceDomain) -> String {
    let content_bytes = serde_json::to_vec(content).unwrap_or_default();
    format!(
        "{}/{}/{}",
        domain.as_str(),
        short_digest(user_id.as_bytes()),
        short_digest(&content_bytes)
    )
}
