//! Load and validate launcher configuration.
use std::{
    env,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::{
    errors::ConfigError,
    paths::{home_default, resolve_home_dir},
};

pub mod artifact;
pub mod credentials;
pub mod launch;
pub mod telemetry;

pub use artifact::{
    parse_artifact_section, ArtifactSection, RawArtifactSection, StalePolicy,
    DEFAULT_ARTIFACT_FILENAME, DEFAULT_ARTIFACT_URL, DEFAULT_CACHE_DIR_NAME,
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS,
};
pub use credentials::{
    parse_credentials_section, CredentialsSection, RawCredentialsSection,
    DEFAULT_CREDENTIALS_DIR_NAME, DEFAULT_CREDENTIALS_FILE, DEFAULT_CREDENTIAL_NAMES,
};
pub use launch::{parse_launch_section, LaunchSection, RawLaunchSection, DEFAULT_PROGRAM};

pub const CONFIG_ENV_KEY: &str = "LAUNCHER_CONFIG_PATH";
pub const CREDENTIALS_ENV_KEY: &str = "LAUNCHER_CREDENTIALS_PATH";
const DEFAULT_CONFIG_DIR_NAME: &str = ".inspector-launcher";
const DEFAULT_CONFIG_FILE: &str = "config.toml";
const COMMAND_LINE_SOURCE: &str = "<command line>";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub artifact: ArtifactSection,
    pub credentials: CredentialsSection,
    pub launch: LaunchSection,
    /// Skip the freshness check and launch whatever is cached.
    pub offline: bool,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawLauncherConfig {
    artifact: Option<RawArtifactSection>,
    credentials: Option<RawCredentialsSection>,
    launch: Option<RawLaunchSection>,
}

/// Per-run overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub on_check_failure: Option<StalePolicy>,
    pub offline: bool,
}

impl LauncherConfig {
    /// Load using the CLI path, then `LAUNCHER_CONFIG_PATH`, then the default location.
    ///
    /// Only the default location may be absent; a named file must exist.
    pub fn load(override_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let home = resolve_home_dir().ok();
        let env_path = env::var_os(CONFIG_ENV_KEY)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let (path, required) = match (override_path, env_path) {
            (Some(path), _) => (path, true),
            (None, Some(path)) => {
                telemetry::log_env_source(&path, true);
                (path, true)
            }
            (None, None) => {
                let path = home_default(home.as_deref(), DEFAULT_CONFIG_DIR_NAME)?
                    .join(DEFAULT_CONFIG_FILE);
                telemetry::log_env_source(&path, false);
                (path, false)
            }
        };

        let mut config = Self::load_from_path(path, required, home.as_deref())?;
        if let Some(file) = env::var_os(CREDENTIALS_ENV_KEY).filter(|value| !value.is_empty()) {
            config.credentials.file = PathBuf::from(file);
        }
        Ok(config)
    }

    /// Load configuration from a specific path, filling defaults relative to `home`.
    ///
    /// `home` is only consulted for settings the file leaves unset.
    pub fn load_from_path(
        path: PathBuf,
        required: bool,
        home: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        info!(
            target: "inspector_launcher::config",
            path = %path.display(),
            required,
            "Starting configuration load"
        );

        let source = config::File::from(path.clone())
            .format(config::FileFormat::Toml)
            .required(required);
        let document = config::Config::builder()
            .add_source(source)
            .build()
            .map_err(|err| {
                let error = ConfigError::from_read_error(path.clone(), err);
                error!(
                    target: "inspector_launcher::config",
                    path = %path.display(),
                    reason = %error,
                    "Failed to read configuration file"
                );
                error
            })?;

        let raw: RawLauncherConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "inspector_launcher::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone(), home).map_err(|err| {
            error!(
                target: "inspector_launcher::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    /// Built-in defaults relative to `home`, as if no configuration file existed.
    pub fn defaults(home: &Path) -> Result<Self, ConfigError> {
        let raw = RawLauncherConfig {
            artifact: None,
            credentials: None,
            launch: None,
        };
        Self::from_raw(raw, PathBuf::from(COMMAND_LINE_SOURCE), Some(home))
    }

    /// Apply command-line overrides, validating each replaced field.
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let source = Path::new(COMMAND_LINE_SOURCE);
        if let Some(url) = overrides.url {
            artifact::validate_url(source, &url)?;
            self.artifact.url = url;
        }
        if let Some(cache_dir) = overrides.cache_dir {
            artifact::validate_cache_dir(source, &cache_dir)?;
            self.artifact.cache_dir = cache_dir;
        }
        if let Some(file) = overrides.credentials_path {
            self.credentials.file = file;
        }
        if let Some(policy) = overrides.on_check_failure {
            self.artifact.on_check_failure = policy;
        }
        self.offline |= overrides.offline;
        Ok(self)
    }

    fn from_raw(
        raw: RawLauncherConfig,
        path: PathBuf,
        home: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let artifact = parse_artifact_section(raw.artifact, &path, home)?;
        let credentials = parse_credentials_section(raw.credentials, &path, home)?;
        let launch = parse_launch_section(raw.launch, &path)?;

        Ok(Self {
            artifact,
            credentials,
            launch,
            offline: false,
            source_path: path,
        })
    }
}
