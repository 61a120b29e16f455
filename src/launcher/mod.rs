//! Refresh the cached artifact, resolve credentials and start the client.
mod spec;
mod startup;

use std::{ffi::OsString, fs, path::PathBuf};

use tracing::warn;

pub use spec::{ensure_executable, LaunchSpec, LaunchedClient};
pub use startup::{run_launcher, RuntimeExit};

use crate::{
    cache::{ArtifactCache, ArtifactSource, CachedArtifact, Freshness, HttpSource},
    config::{LauncherConfig, StalePolicy},
    credentials::{CredentialSet, CredentialStore},
    lib::errors::{FetchError, LaunchError, SpawnError},
};

/// Result of the freshness step.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The check completed.
    Fresh(Freshness),
    /// The check failed on the network side and policy allows the cached copy.
    Stale(FetchError),
    /// Offline mode; no check was attempted.
    Skipped,
}

impl RefreshOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Fresh(freshness) => freshness.as_str(),
            RefreshOutcome::Stale(_) => "stale",
            RefreshOutcome::Skipped => "skipped",
        }
    }
}

/// Orchestrates one launcher run.
#[derive(Debug)]
pub struct Launcher<S> {
    config: LauncherConfig,
    artifact: CachedArtifact,
    cache: ArtifactCache<S>,
    credentials: CredentialStore,
}

impl Launcher<HttpSource> {
    /// Launcher downloading over HTTP with the configured timeouts.
    pub fn from_config(config: LauncherConfig) -> Result<Self, LaunchError> {
        let source = HttpSource::new(
            config.artifact.connect_timeout_secs,
            config.artifact.timeout_secs,
        )?;
        Ok(Self::with_source(config, source))
    }
}

impl<S: ArtifactSource> Launcher<S> {
    pub fn with_source(config: LauncherConfig, source: S) -> Self {
        let artifact = CachedArtifact::from_section(&config.artifact);
        let credentials = CredentialStore::from_section(&config.credentials);
        Self {
            config,
            artifact,
            cache: ArtifactCache::new(source),
            credentials,
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn artifact(&self) -> &CachedArtifact {
        &self.artifact
    }

    pub fn cache(&self) -> &ArtifactCache<S> {
        &self.cache
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Create the cache directory (and parents) if needed.
    pub fn ensure_cache_dir(&self) -> Result<(), LaunchError> {
        let dir = &self.config.artifact.cache_dir;
        fs::create_dir_all(dir).map_err(|source| LaunchError::CacheDir {
            path: dir.clone(),
            source,
        })
    }

    /// Run the freshness check, applying the configured failure policy.
    pub async fn refresh(&self) -> Result<RefreshOutcome, LaunchError> {
        self.ensure_cache_dir()?;
        if self.config.offline {
            return Ok(RefreshOutcome::Skipped);
        }

        match self.cache.refresh(&self.artifact).await {
            Ok(freshness) => Ok(RefreshOutcome::Fresh(freshness)),
            Err(err)
                if err.is_network()
                    && self.config.artifact.on_check_failure == StalePolicy::LaunchStale
                    && self.artifact.exists() =>
            {
                warn!(
                    target: "inspector_launcher::cache",
                    reason = %err,
                    path = %self.artifact.local_path.display(),
                    "Freshness check failed; launching the cached artifact"
                );
                Ok(RefreshOutcome::Stale(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Build the process description for the cached artifact.
    pub fn build_spec(&self, environment: CredentialSet, extra_args: &[String]) -> LaunchSpec {
        let launch = &self.config.launch;
        let artifact_path = self.artifact.local_path.clone();

        let (program, mut arguments) = match &launch.program {
            Some(program) => {
                let mut arguments: Vec<OsString> =
                    launch.program_args.iter().map(OsString::from).collect();
                arguments.push(artifact_path.into_os_string());
                (PathBuf::from(program), arguments)
            }
            None => (artifact_path, Vec::new()),
        };
        arguments.extend(launch.client_args.iter().map(OsString::from));
        arguments.extend(extra_args.iter().map(OsString::from));

        LaunchSpec {
            program,
            arguments,
            working_directory: self.config.artifact.cache_dir.clone(),
            environment,
        }
    }

    /// Refresh, resolve credentials and start the client without waiting for it.
    pub async fn run(&self, extra_args: &[String]) -> Result<LaunchedClient, LaunchError> {
        self.refresh().await?;

        if !self.artifact.exists() {
            return Err(SpawnError::MissingArtifact {
                path: self.artifact.local_path.clone(),
            }
            .into());
        }
        if self.config.launch.program.is_none() {
            ensure_executable(&self.artifact.local_path)?;
        }

        let environment = self.credentials.resolve();
        let spec = self.build_spec(environment, extra_args);
        Ok(spec.spawn()?)
    }
}
