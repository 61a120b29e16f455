use std::path::{Path, PathBuf};

use clap::ValueEnum;
use reqwest::Url;
use serde::Deserialize;

use crate::lib::{
    errors::ConfigError,
    paths::{home_default, is_nonempty_absolute, is_plain_file_name},
};

pub const DEFAULT_ARTIFACT_URL: &str =
    "https://media.z-kris.com/runelite-event-inspector-client.jar";
pub const DEFAULT_CACHE_DIR_NAME: &str = ".runelite_inspector_clients";
pub const DEFAULT_ARTIFACT_FILENAME: &str = "RuneLite.jar";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// What to do when the freshness check cannot complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Refuse to launch.
    #[default]
    Abort,
    /// Launch the previously cached artifact after a network failure.
    #[value(name = "launch_stale")]
    LaunchStale,
}

impl StalePolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StalePolicy::Abort => "abort",
            StalePolicy::LaunchStale => "launch_stale",
        }
    }
}

/// Download and cache settings.
#[derive(Debug, Clone)]
pub struct ArtifactSection {
    pub url: String,
    pub cache_dir: PathBuf,
    pub filename: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub on_check_failure: StalePolicy,
}

impl ArtifactSection {
    /// Location of the cached artifact.
    pub fn local_path(&self) -> PathBuf {
        self.cache_dir.join(&self.filename)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawArtifactSection {
    pub url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub filename: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub on_check_failure: Option<StalePolicy>,
}

pub fn parse_artifact_section(
    raw: Option<RawArtifactSection>,
    path: &Path,
    home: Option<&Path>,
) -> Result<ArtifactSection, ConfigError> {
    let raw = raw.unwrap_or_default();

    let url = raw.url.unwrap_or_else(|| DEFAULT_ARTIFACT_URL.to_string());
    validate_url(path, &url)?;

    let cache_dir = match raw.cache_dir {
        Some(cache_dir) => cache_dir,
        None => home_default(home, DEFAULT_CACHE_DIR_NAME)?,
    };
    validate_cache_dir(path, &cache_dir)?;

    let filename = raw
        .filename
        .unwrap_or_else(|| DEFAULT_ARTIFACT_FILENAME.to_string());
    if !is_plain_file_name(&filename) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "artifact.filename",
            message: format!("Provide a bare file name without directories: {filename}"),
        });
    }

    let connect_timeout_secs = raw
        .connect_timeout_secs
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    validate_range(
        path,
        "artifact.connect_timeout_secs",
        connect_timeout_secs,
        1..=300,
    )?;

    let timeout_secs = raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    validate_range(path, "artifact.timeout_secs", timeout_secs, 1..=3600)?;

    Ok(ArtifactSection {
        url,
        cache_dir,
        filename,
        connect_timeout_secs,
        timeout_secs,
        on_check_failure: raw.on_check_failure.unwrap_or_default(),
    })
}

pub fn validate_url(path: &Path, url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|err| ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "artifact.url",
        message: format!("Not a valid URL ({err}): {url}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "artifact.url",
            message: format!("Only http and https URLs are supported: {url}"),
        });
    }
    Ok(())
}

pub fn validate_cache_dir(path: &Path, cache_dir: &Path) -> Result<(), ConfigError> {
    if !is_nonempty_absolute(cache_dir) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "artifact.cache_dir",
            message: format!("Provide an absolute directory: {}", cache_dir.display()),
        });
    }
    Ok(())
}

fn validate_range(
    path: &Path,
    field: &'static str,
    value: u64,
    range: std::ops::RangeInclusive<u64>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: format!(
            "Specify a value between {} and {} seconds",
            range.start(),
            range.end()
        ),
    })
}
