use std::{io, path::PathBuf, process::ExitCode};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
    /// No home directory could be determined for the default locations.
    #[error("Could not determine the home directory; set explicit paths in the configuration")]
    HomeUnavailable,
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures of the freshness check.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} timed out after {timeout_secs} seconds")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("Download from {url} returned HTTP {status}")]
    BadStatus { url: String, status: u16 },
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to initialize the HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True when the failure happened on the network side and the cache on disk is untouched.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Unreachable { .. }
                | FetchError::Timeout { .. }
                | FetchError::BadStatus { .. }
        )
    }
}

/// Problems reading the credentials properties file. Never fatal.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read credentials file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed credentials file {path} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Failures starting the client process.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Cached artifact {path} does not exist; run once with network access")]
    MissingArtifact { path: PathBuf },
    #[error("Failed to mark {path} as executable: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Anything that stops a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Freshness check failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

impl LaunchError {
    /// Exit code following the `sysexits.h` conventions.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LaunchError::Config(_) => ExitCode::from(78),
            LaunchError::Fetch(_) => ExitCode::from(69),
            LaunchError::CacheDir { .. } => ExitCode::from(73),
            LaunchError::Spawn(_) => ExitCode::from(71),
        }
    }
}
