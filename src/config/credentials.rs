use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lib::{
    errors::ConfigError,
    paths::{home_default, is_nonempty_absolute, resolve_against},
};

pub const DEFAULT_CREDENTIALS_DIR_NAME: &str = ".runelite";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.properties";
pub const DEFAULT_CREDENTIAL_NAMES: &[&str] = &[
    "JX_ACCESS_TOKEN",
    "JX_REFRESH_TOKEN",
    "JX_SESSION_ID",
    "JX_CHARACTER_ID",
    "JX_DISPLAY_NAME",
];

/// Where launcher credentials come from and which variables are forwarded.
#[derive(Debug, Clone)]
pub struct CredentialsSection {
    pub dir: PathBuf,
    pub file: PathBuf,
    pub names: Vec<String>,
}

impl CredentialsSection {
    /// Full path of the properties file; relative `file` values resolve against `dir`.
    pub fn properties_path(&self) -> PathBuf {
        resolve_against(&self.dir, &self.file)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawCredentialsSection {
    pub dir: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub names: Option<Vec<String>>,
}

pub fn parse_credentials_section(
    raw: Option<RawCredentialsSection>,
    path: &Path,
    home: Option<&Path>,
) -> Result<CredentialsSection, ConfigError> {
    let raw = raw.unwrap_or_default();

    let dir = match raw.dir {
        Some(dir) => dir,
        None => home_default(home, DEFAULT_CREDENTIALS_DIR_NAME)?,
    };
    if !is_nonempty_absolute(&dir) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "credentials.dir",
            message: format!("Provide an absolute directory: {}", dir.display()),
        });
    }

    let file = raw
        .file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));
    if file.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "credentials.file",
            message: "File name cannot be empty".into(),
        });
    }

    let names = raw.names.unwrap_or_else(|| {
        DEFAULT_CREDENTIAL_NAMES
            .iter()
            .map(|name| name.to_string())
            .collect()
    });
    validate_names(path, &names)?;

    Ok(CredentialsSection { dir, file, names })
}

fn validate_names(path: &Path, names: &[String]) -> Result<(), ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "credentials.names",
            message: "Specify at least one variable name".into(),
        });
    }
    for name in names {
        if name.trim().is_empty() || name.contains('=') || name.contains('\0') {
            return Err(ConfigError::InvalidField {
                path: path.to_path_buf(),
                field: "credentials.names",
                message: format!("Not a valid environment variable name: {name:?}"),
            });
        }
    }
    Ok(())
}
