//! Single-file artifact cache kept in sync with a download URL.
//!
//! Every check downloads the remote artifact into a temporary file next to the
//! cached copy, hashing while it streams. The temporary file is renamed over
//! the cached copy only when the digests differ (or nothing was cached yet), so
//! the cached file is always either absent or a complete download.

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::{Builder as TempBuilder, NamedTempFile};
use tracing::{debug, info};

use crate::{
    config::ArtifactSection,
    lib::{
        digest::{digest_file, DigestingWriter},
        errors::FetchError,
    },
};

pub mod source;

pub use source::{ArtifactSource, HttpSource};

const STAGING_PREFIX: &str = ".download-";

/// The cached artifact and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub local_path: PathBuf,
    pub remote_url: String,
    pub filename: String,
}

impl CachedArtifact {
    pub fn from_section(section: &ArtifactSection) -> Self {
        Self {
            local_path: section.local_path(),
            remote_url: section.url.clone(),
            filename: section.filename.clone(),
        }
    }

    pub fn exists(&self) -> bool {
        self.local_path.is_file()
    }
}

/// Outcome of a successful freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing was cached; the download is now in place.
    Installed { digest: String },
    /// The cached copy already matched.
    Unchanged { digest: String },
    /// The cached copy was stale and has been replaced.
    Replaced { previous: String, current: String },
}

impl Freshness {
    /// Digest of the artifact now on disk.
    pub fn digest(&self) -> &str {
        match self {
            Freshness::Installed { digest } | Freshness::Unchanged { digest } => digest,
            Freshness::Replaced { current, .. } => current,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Freshness::Installed { .. } => "installed",
            Freshness::Unchanged { .. } => "unchanged",
            Freshness::Replaced { .. } => "replaced",
        }
    }
}

/// Temporary file receiving a download; removed on drop unless persisted.
#[derive(Debug)]
pub struct StagedDownload {
    writer: DigestingWriter<BufWriter<NamedTempFile>>,
    temp_path: PathBuf,
}

impl StagedDownload {
    /// Create the staging file inside `dir` so the final rename stays on one filesystem.
    pub fn create(dir: &Path) -> Result<Self, FetchError> {
        let file = TempBuilder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(dir)
            .map_err(|source| FetchError::filesystem(dir, source))?;
        let temp_path = file.path().to_path_buf();
        Ok(Self {
            writer: DigestingWriter::new(BufWriter::new(file)),
            temp_path,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), FetchError> {
        self.writer
            .write_all(chunk)
            .map_err(|source| FetchError::filesystem(&self.temp_path, source))
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Flush everything to disk and return the temporary file with its digest.
    fn finish(self) -> Result<(NamedTempFile, String), FetchError> {
        let temp_path = self.temp_path;
        let (buffered, digest) = self
            .writer
            .finish()
            .map_err(|source| FetchError::filesystem(&temp_path, source))?;
        let file = buffered
            .into_inner()
            .map_err(|err| FetchError::filesystem(&temp_path, err.into_error()))?;
        file.as_file()
            .sync_all()
            .map_err(|source| FetchError::filesystem(&temp_path, source))?;
        Ok((file, digest))
    }
}

/// Keeps one local file identical to the bytes served by a source.
#[derive(Debug, Clone)]
pub struct ArtifactCache<S> {
    source: S,
}

impl<S: ArtifactSource> ArtifactCache<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Make `local_path` match the bytes currently served at `remote_url`.
    ///
    /// `local_path` is only written when it is absent or its digest differs.
    /// On any error it is left exactly as it was.
    pub async fn ensure_fresh(
        &self,
        remote_url: &str,
        local_path: &Path,
    ) -> Result<Freshness, FetchError> {
        let dir = match local_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        info!(
            target: "inspector_launcher::cache",
            url = remote_url,
            path = %local_path.display(),
            "Checking artifact for updates"
        );

        let mut staged = StagedDownload::create(dir)?;
        self.source.fetch_into(remote_url, &mut staged).await?;
        let size_bytes = staged.bytes_written();
        let (temp, remote_digest) = staged.finish()?;

        let (previous, existing_permissions) = match fs::metadata(local_path) {
            Ok(metadata) => (
                Some(
                    digest_file(local_path)
                        .map_err(|source| FetchError::filesystem(local_path, source))?,
                ),
                Some(metadata.permissions()),
            ),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (None, None),
            Err(err) => return Err(FetchError::filesystem(local_path, err)),
        };

        let freshness = match previous {
            Some(previous) if previous == remote_digest => {
                debug!(
                    target: "inspector_launcher::cache",
                    digest = %remote_digest,
                    "Cached artifact is up to date"
                );
                return Ok(Freshness::Unchanged {
                    digest: remote_digest,
                });
            }
            Some(previous) => Freshness::Replaced {
                previous,
                current: remote_digest,
            },
            None => Freshness::Installed {
                digest: remote_digest,
            },
        };

        set_published_permissions(temp.as_file(), existing_permissions)
            .map_err(|source| FetchError::filesystem(temp.path(), source))?;
        temp.persist(local_path)
            .map_err(|err| FetchError::filesystem(local_path, err.error))?;

        info!(
            target: "inspector_launcher::cache",
            path = %local_path.display(),
            status = freshness.as_str(),
            digest = freshness.digest(),
            size_bytes,
            "Cached artifact written"
        );
        Ok(freshness)
    }

    /// Refresh a [`CachedArtifact`].
    pub async fn refresh(&self, artifact: &CachedArtifact) -> Result<Freshness, FetchError> {
        self.ensure_fresh(&artifact.remote_url, &artifact.local_path)
            .await
    }
}

/// Staging files are created 0600; a replacement keeps the mode of the file it
/// replaces and a first install gets 0644.
fn set_published_permissions(
    file: &fs::File,
    existing: Option<fs::Permissions>,
) -> std::io::Result<()> {
    if let Some(permissions) = existing {
        return file.set_permissions(permissions);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fs, io};

    use tempfile::tempdir;

    use crate::lib::digest::digest_bytes;

    use super::*;

    struct MemorySource {
        body: RefCell<Vec<u8>>,
    }

    impl MemorySource {
        fn new(body: &[u8]) -> Self {
            Self {
                body: RefCell::new(body.to_vec()),
            }
        }

        fn set(&self, body: &[u8]) {
            *self.body.borrow_mut() = body.to_vec();
        }
    }

    impl ArtifactSource for MemorySource {
        async fn fetch_into(
            &self,
            _url: &str,
            sink: &mut StagedDownload,
        ) -> Result<(), FetchError> {
            for piece in self.body.borrow().chunks(3) {
                sink.write_chunk(piece)?;
            }
            Ok(())
        }
    }

    struct TruncatingSource;

    impl ArtifactSource for TruncatingSource {
        async fn fetch_into(
            &self,
            url: &str,
            sink: &mut StagedDownload,
        ) -> Result<(), FetchError> {
            sink.write_chunk(b"half of an arti")?;
            Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: 1,
            })
        }
    }

    const URL: &str = "https://example.invalid/client.jar";

    fn staging_leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .expect("can list cache dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .count()
    }

    #[tokio::test]
    async fn absent_cache_is_installed() {
        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        let cache = ArtifactCache::new(MemorySource::new(b"v1"));

        let freshness = cache.ensure_fresh(URL, &local).await.expect("install");

        assert_eq!(
            freshness,
            Freshness::Installed {
                digest: digest_bytes(b"v1")
            }
        );
        assert_eq!(fs::read(&local).expect("read cache"), b"v1");
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[tokio::test]
    async fn matching_cache_is_not_rewritten() {
        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        fs::write(&local, b"v1").expect("seed cache");
        let before = fs::metadata(&local)
            .and_then(|meta| meta.modified())
            .expect("mtime");
        let cache = ArtifactCache::new(MemorySource::new(b"v1"));

        let freshness = cache.ensure_fresh(URL, &local).await.expect("check");

        assert_eq!(freshness.as_str(), "unchanged");
        let after = fs::metadata(&local)
            .and_then(|meta| meta.modified())
            .expect("mtime");
        assert_eq!(before, after, "unchanged artifact must not be touched");
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[tokio::test]
    async fn stale_cache_is_replaced_and_rehashes_to_remote_digest() {
        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        let source = MemorySource::new(b"v1");
        let cache = ArtifactCache::new(source);

        cache.ensure_fresh(URL, &local).await.expect("install v1");
        cache.source().set(b"v2");
        let freshness = cache.ensure_fresh(URL, &local).await.expect("update to v2");

        assert_eq!(
            freshness,
            Freshness::Replaced {
                previous: digest_bytes(b"v1"),
                current: digest_bytes(b"v2"),
            }
        );
        assert_eq!(fs::read(&local).expect("read cache"), b"v2");
        assert_eq!(
            digest_file(&local).expect("rehash cache"),
            digest_bytes(b"v2")
        );
    }

    #[tokio::test]
    async fn failed_download_leaves_existing_cache_intact() {
        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        fs::write(&local, b"previous release").expect("seed cache");
        let cache = ArtifactCache::new(TruncatingSource);

        let error = cache
            .ensure_fresh(URL, &local)
            .await
            .expect_err("source fails mid-stream");

        assert!(error.is_network());
        assert_eq!(fs::read(&local).expect("read cache"), b"previous release");
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[tokio::test]
    async fn failed_first_download_leaves_nothing_behind() {
        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        let cache = ArtifactCache::new(TruncatingSource);

        cache
            .ensure_fresh(URL, &local)
            .await
            .expect_err("source fails mid-stream");

        assert!(!local.exists());
        assert_eq!(staging_leftovers(temp.path()), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn installed_artifact_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        let cache = ArtifactCache::new(MemorySource::new(b"v1"));

        cache.ensure_fresh(URL, &local).await.expect("install");

        let mode = fs::metadata(&local).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn replaced_artifact_keeps_previous_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("client.jar");
        fs::write(&local, b"v1").expect("seed cache");
        fs::set_permissions(&local, fs::Permissions::from_mode(0o755)).expect("chmod");
        let cache = ArtifactCache::new(MemorySource::new(b"v2"));

        let freshness = cache.ensure_fresh(URL, &local).await.expect("replace");

        assert_eq!(freshness.as_str(), "replaced");
        let mode = fs::metadata(&local).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn missing_cache_directory_is_a_filesystem_error() {
        let temp = tempdir().expect("can create temporary directory");
        let local = temp.path().join("not-created").join("client.jar");
        let cache = ArtifactCache::new(MemorySource::new(b"v1"));

        let error = cache
            .ensure_fresh(URL, &local)
            .await
            .expect_err("directory is missing");

        match error {
            FetchError::Filesystem { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }
}
