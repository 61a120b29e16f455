use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::{Child, Command};
use tracing::info;

use crate::{credentials::CredentialSet, lib::errors::SpawnError};

/// Everything needed to start the client once.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub arguments: Vec<OsString>,
    pub working_directory: PathBuf,
    /// Set on top of the inherited environment.
    pub environment: CredentialSet,
}

impl LaunchSpec {
    /// Start the process and return immediately; the child is never waited on here.
    pub fn spawn(&self) -> Result<LaunchedClient, SpawnError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.arguments)
            .current_dir(&self.working_directory)
            .envs(self.environment.iter())
            .stdin(Stdio::null());

        for name in self.environment.names() {
            info!(
                target: "inspector_launcher::launch",
                name,
                "Set environment variable before launching client"
            );
        }

        let child = command.spawn().map_err(|source| SpawnError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        info!(
            target: "inspector_launcher::launch",
            program = %self.program.display(),
            arguments = ?self.arguments,
            working_directory = %self.working_directory.display(),
            pid = child.id(),
            "Started client"
        );
        Ok(LaunchedClient { child })
    }
}

/// Handle to a started client. Dropping it leaves the process running.
#[derive(Debug)]
pub struct LaunchedClient {
    child: Child,
}

impl LaunchedClient {
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take the underlying child for callers that do want to supervise it.
    pub fn into_child(self) -> Child {
        self.child
    }
}

/// Add execute permission for everyone who can read the artifact.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> Result<(), SpawnError> {
    use std::{fs, os::unix::fs::PermissionsExt};

    let to_error = |source| SpawnError::Permissions {
        path: path.to_path_buf(),
        source,
    };
    let mut permissions = fs::metadata(path).map_err(to_error)?.permissions();
    let mode = permissions.mode();
    let wanted = mode | ((mode & 0o444) >> 2);
    if wanted != mode {
        permissions.set_mode(wanted);
        fs::set_permissions(path, permissions).map_err(to_error)?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_executable(_path: &Path) -> Result<(), SpawnError> {
    Ok(())
}
