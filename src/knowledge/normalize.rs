//! Text canonicalization, content hashing, and token estimation.
//!
//! Normalization absorbs cosmetic edits (editor line-ending churn,
//! trailing whitespace) so re-indexing is triggered only by substantive
//! changes. It is deliberately minimal: CRLF → LF and per-line trailing
//! space/tab stripping, nothing else — no case folding, no Unicode
//! normalization. The operation is idempotent.

use sha2::{Digest, Sha256};

/// Canonicalize text: every CRLF becomes LF, then each line loses its
/// trailing ASCII spaces and tabs.
pub fn normalize(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    let lines: Vec<&str> = unix
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect();
    lines.join("\n")
}

/// Lowercase-hex SHA-256 of the normalized byte sequence.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Coarse token estimate: `⌈chars / 4⌉`.
///
/// Fixed (not model-specific) so chunk boundaries and audit thresholds
/// are reproducible across model swaps.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
