//! Shared path helpers (home directory resolution, override joining).

use std::path::{Path, PathBuf};

use crate::lib::errors::ConfigError;

/// Returns true if the path is non-empty and absolute.
pub fn is_nonempty_absolute(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_absolute()
}

/// Returns true if the value is a bare file name with no directory components.
pub fn is_plain_file_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.trim().is_empty()
        && path.file_name().map(|file| file == path.as_os_str()) == Some(true)
}

/// Resolve the current user's home directory.
pub fn resolve_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeUnavailable)
}

/// `<home>/<name>`, failing only now that a home-relative default is needed.
pub fn home_default(home: Option<&Path>, name: &str) -> Result<PathBuf, ConfigError> {
    home.map(|home| home.join(name))
        .ok_or(ConfigError::HomeUnavailable)
}

/// Join an override path onto a base directory unless it is already absolute.
pub fn resolve_against(base: &Path, candidate: &Path) -> PathBuf {
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}
