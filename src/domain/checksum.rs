//! Content fingerprints.
//!
//! A fingerprint is the SHA256 digest of a block of bytes, rendered as 64
//! lowercase hex characters. Any byte-level change to the input changes the
//! fingerprint, which is how drift between a requirement's recorded state and
//! its current body is detected.

use sha2::{Digest, Sha256};

/// Calculate the fingerprint of `content`.
///
/// The output is stable across runs and platforms.
///
/// ```
/// use contextgit::fingerprint;
///
/// let hash = fingerprint(b"The system shall log every request.");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, fingerprint(b"The system shall log every request."));
/// ```
#[must_use]
pub fn fingerprint(content: &[u8]) -> String {
    let hash = Sha256::digest(content);
    format!("{hash:x}")
}
