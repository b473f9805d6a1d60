//! Checksums of produced documents
//!
//! Each archive entry is fingerprinted with SHA-256 when it is written, so a
//! later verification run can detect entries that changed on disk.

use sha2::{Digest, Sha256};

/// Calculate SHA-256 checksum of raw bytes
///
/// Returns a hex-encoded SHA-256 checksum string (64 characters).
///
/// # Examples
///
/// ```
/// use phdc::core::verification::checksum::calculate_checksum_bytes;
///
/// let checksum = calculate_checksum_bytes(b"<ClinicalDocument/>");
/// assert_eq!(checksum.len(), 64);
/// ```
pub fn calculate_checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{result:x}")
}

/// Whether `data` hashes to `expected` (hex, case-insensitive)
pub fn matches_checksum(data: &[u8], expected: &str) -> bool {
    calculate_checksum_bytes(data).eq_ignore_ascii_case(expected.trim())
}
