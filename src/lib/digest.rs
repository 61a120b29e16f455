//! Content digests used for artifact change detection.
//!
//! SHA-256 is used only to notice that the remote artifact changed. It is not
//! an integrity guarantee against a hostile download server.

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use sha2::{Digest, Sha256};

/// Chunk size used when reading streams.
pub const DIGEST_CHUNK_SIZE: usize = 8192;

/// Incremental hasher producing lowercase hex digests.
#[derive(Debug, Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn finalize_hex(self) -> String {
        format!("{:x}", self.inner.finalize())
    }
}

/// Digest of an in-memory byte slice.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(bytes);
    hasher.finalize_hex()
}

/// Digest of a whole stream, read in [`DIGEST_CHUNK_SIZE`] chunks.
pub fn digest_reader<R: Read>(reader: R) -> io::Result<String> {
    digest_reader_chunked(reader, DIGEST_CHUNK_SIZE)
}

/// Digest of a whole stream using an explicit chunk size (clamped to at least one byte).
pub fn digest_reader_chunked<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<String> {
    let mut hasher = ContentHasher::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize_hex())
}

/// Digest of a file on disk.
pub fn digest_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    digest_reader(file)
}

/// `Write` adapter that hashes everything it forwards to `inner`.
#[derive(Debug)]
pub struct DigestingWriter<W> {
    inner: W,
    hasher: ContentHasher,
    written: u64,
}

impl<W: Write> DigestingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: ContentHasher::new(),
            written: 0,
        }
    }

    /// Number of bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush the inner writer and return it together with the hex digest.
    pub fn finish(mut self) -> io::Result<(W, String)> {
        self.inner.flush()?;
        Ok((self.inner, self.hasher.finalize_hex()))
    }
}

impl<W: Write> Write for DigestingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
