//! Cache record model and fingerprint construction.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::digest::DigestSet;

/// The persisted digest triple for one file identity.
///
/// A record is valid exactly as long as its fingerprint's inputs (absolute
/// path, modification time) are unchanged; a modified file produces a new
/// fingerprint and therefore a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    /// CRC-32, 8 hex digits.
    pub crc32: String,
    /// MD5, 32 hex digits.
    pub md5: String,
    /// SHA-1, 40 hex digits.
    pub sha1: String,
}

impl From<DigestSet> for HashRecord {
    fn from(d: DigestSet) -> Self {
        Self {
            crc32: d.crc32,
            md5: d.md5,
            sha1: d.sha1,
        }
    }
}

/// Compute the cache key for a file identity.
///
/// SHA-256 over the absolute path and the mtime seconds. The path is hashed
/// as raw OS bytes on Unix so distinct non-UTF-8 paths stay distinct, and
/// each field is length-prefixed to rule out boundary collisions between
/// path bytes and the timestamp.
#[must_use]
pub fn fingerprint(path: &Path, mtime_secs: i64) -> String {
    let mut hasher = Sha256::new();

    #[cfg(unix)]
    let path_bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let path_bytes = path.to_string_lossy().into_owned().into_bytes();

    hasher.update((path_bytes.len() as u64).to_be_bytes());
    hasher.update(&path_bytes);
    hasher.update(mtime_secs.to_be_bytes());

    let mut out = String::with_capacity(64);
    for b in hasher.finalize() {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
