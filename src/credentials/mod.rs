//! Launcher credentials: a properties file overlaid by the process environment.
//!
//! A recognized variable takes its value from the environment when set there,
//! otherwise from the properties file. Empty results are dropped so the child
//! never sees a blank credential. Missing or unreadable files are not errors;
//! guest and first-time runs have no credentials at all.

use std::{
    collections::BTreeMap,
    env, fmt, fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{config::CredentialsSection, lib::errors::CredentialError};

pub mod properties;

pub use properties::{parse_properties, Properties, PropertiesError};

/// Resolved credential values keyed by variable name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    values: BTreeMap<String, String>,
}

impl CredentialSet {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn insert(&mut self, name: String, value: String) {
        self.values.insert(name, value);
    }
}

// Values are secrets; only names are printed.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialOrigin {
    Env,
    File,
}

/// A recognized name that resolved to a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedName {
    pub name: String,
    pub origin: CredentialOrigin,
}

/// Reads credentials for a fixed set of variable names.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    properties_path: PathBuf,
    names: Vec<String>,
}

impl CredentialStore {
    pub fn new(properties_path: impl Into<PathBuf>, names: Vec<String>) -> Self {
        Self {
            properties_path: properties_path.into(),
            names,
        }
    }

    pub fn from_section(section: &CredentialsSection) -> Self {
        Self::new(section.properties_path(), section.names.clone())
    }

    pub fn properties_path(&self) -> &Path {
        &self.properties_path
    }

    /// Resolve against the real process environment.
    pub fn resolve(&self) -> CredentialSet {
        self.resolve_with(|name| env::var(name).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn resolve_with<F>(&self, lookup: F) -> CredentialSet
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut set = CredentialSet::default();
        for (name, value, origin) in self.resolve_entries(lookup) {
            debug!(
                target: "inspector_launcher::credentials",
                name = %name,
                origin = ?origin,
                "Resolved launcher credential"
            );
            set.insert(name, value);
        }
        set
    }

    /// Report which names resolve and from where, without values.
    pub fn describe_with<F>(&self, lookup: F) -> Vec<ResolvedName>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.resolve_entries(lookup)
            .into_iter()
            .map(|(name, _, origin)| ResolvedName { name, origin })
            .collect()
    }

    pub fn describe(&self) -> Vec<ResolvedName> {
        self.describe_with(|name| env::var(name).ok())
    }

    fn resolve_entries<F>(&self, lookup: F) -> Vec<(String, String, CredentialOrigin)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match load_properties(&self.properties_path) {
            Ok(properties) => properties.unwrap_or_default(),
            Err(err) => {
                warn!(
                    target: "inspector_launcher::credentials",
                    reason = %err,
                    "Unable to load credentials from disk; continuing without them"
                );
                Properties::new()
            }
        };

        let mut entries = Vec::new();
        for name in &self.names {
            let (value, origin) = match lookup(name) {
                Some(value) => (value, CredentialOrigin::Env),
                None => match file.get(name) {
                    Some(value) => (value.clone(), CredentialOrigin::File),
                    None => continue,
                },
            };
            if value.is_empty() {
                continue;
            }
            entries.push((name.clone(), value, origin));
        }
        entries
    }
}

/// Resolve `recognized_names` from the environment and the file at `properties_path`.
pub fn resolve(properties_path: &Path, recognized_names: &[String]) -> CredentialSet {
    CredentialStore::new(properties_path, recognized_names.to_vec()).resolve()
}

/// Read and parse a properties file; `Ok(None)` when it does not exist.
pub fn load_properties(path: &Path) -> Result<Option<Properties>, CredentialError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(
                target: "inspector_launcher::credentials",
                path = %path.display(),
                "No credentials file present"
            );
            return Ok(None);
        }
        Err(source) => {
            return Err(CredentialError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let properties = parse_properties(&content).map_err(|err| CredentialError::Parse {
        path: path.to_path_buf(),
        line: err.line,
        message: err.message,
    })?;

    if !properties.is_empty() {
        info!(
            target: "inspector_launcher::credentials",
            path = %path.display(),
            count = properties.len(),
            "Read credentials from disk"
        );
    }
    Ok(Some(properties))
}
