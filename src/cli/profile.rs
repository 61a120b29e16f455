//! LaunchProfile and config path resolution.
use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::ConfigOverrides;

/// Resolved launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    /// Explicit config file, if one was named on the command line.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    /// Passed through to the client.
    pub client_args: Vec<String>,
    /// Effective flags, for logging.
    pub launch_args: Vec<String>,
}

/// Make a command-line config path absolute against the current directory.
pub fn resolve_config_path(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }

    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok(cwd.join(path))
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(config: Option<&Path>, overrides: &ConfigOverrides) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(config) = config {
        args.push(format!("--config={}", config.display()));
    }
    if let Some(url) = &overrides.url {
        args.push(format!("--url={url}"));
    }
    if let Some(dir) = &overrides.cache_dir {
        args.push(format!("--cache-dir={}", dir.display()));
    }
    if let Some(path) = &overrides.credentials_path {
        args.push(format!("--credentials={}", path.display()));
    }
    if let Some(policy) = overrides.on_check_failure {
        args.push(format!("--on-check-failure={}", policy.as_str()));
    }
    if overrides.offline {
        args.push("--offline".to_string());
    }
    args
}
