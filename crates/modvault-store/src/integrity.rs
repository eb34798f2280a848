//! Content digests for uploaded archives.
//!
//! The ingester hashes the archive while it is copied into the staging
//! workspace so the digest costs no extra pass over the data.

use std::io::{self, Write};

use sha2::{Digest, Sha256};

/// A content hash (SHA-256 hex digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Hash an in-memory buffer, for checking what a `HashingWriter` produced.
    #[cfg(test)]
    pub(crate) fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex_encode(&hasher.finalize()))
    }

    /// Get the hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode bytes as lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A writer that hashes and counts everything passed through it.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        HashingWriter {
            inner,
            hasher: Sha256::new(),
            written: 0,
        }
    }

    /// Finish hashing, returning the inner writer, the digest and the byte count.
    pub fn finish(self) -> (W, ContentHash, u64) {
        let hash = ContentHash(hex_encode(&self.hasher.finalize()));
        (self.inner, hash, self.written)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
