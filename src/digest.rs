//! Streaming CRC32/MD5/SHA-1 computation.
//!
//! A single sequential pass over the file feeds all three digests at once;
//! the file is never read twice. The read-chunk size is a throughput knob
//! only: large files get 1 MiB reads, everything else 32 KiB.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use md5::Md5;
use sha1::{Digest, Sha1};

/// Files above this size are read in [`LARGE_CHUNK`] units.
const LARGE_FILE_THRESHOLD: u64 = 1 << 30; // 1 GiB
const LARGE_CHUNK: usize = 1 << 20; // 1 MiB
const SMALL_CHUNK: usize = 32 * 1024;

/// The digest triple for one file, all lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSet {
    /// CRC-32 (IEEE polynomial), 8 hex digits.
    pub crc32: String,
    /// MD5, 32 hex digits.
    pub md5: String,
    /// SHA-1, 40 hex digits.
    pub sha1: String,
}

/// Errors that can occur while hashing a file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file could not be opened (or its metadata read).
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A read failed partway through the file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path being read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Pick the read-chunk size for a file of `size` bytes.
#[must_use]
pub fn chunk_size_for(size: u64) -> usize {
    if size > LARGE_FILE_THRESHOLD {
        LARGE_CHUNK
    } else {
        SMALL_CHUNK
    }
}

/// Compute the CRC32/MD5/SHA-1 triple for one file in a single pass.
pub fn digest_file(path: &Path) -> Result<DigestSet, HashError> {
    let open_err = |source| HashError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(open_err)?;
    let size = file
        .metadata()
        .map_err(|source| HashError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    let mut crc32 = crc32fast::Hasher::new();
    let mut md5 = Md5::new();
    let mut sha1 = Sha1::new();

    let mut buf = vec![0u8; chunk_size_for(size)];
    loop {
        let n = file.read(&mut buf).map_err(|source| HashError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        crc32.update(&buf[..n]);
        md5.update(&buf[..n]);
        sha1.update(&buf[..n]);
    }

    Ok(DigestSet {
        crc32: format!("{:08x}", crc32.finalize()),
        md5: to_hex(&md5.finalize()),
        sha1: to_hex(&sha1.finalize()),
    })
}

/// Lowercase hex encoding of a digest output.
fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
