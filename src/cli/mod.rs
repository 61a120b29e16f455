//! CLI entrypoint module structure.
use anyhow::Result;
use serde_json::json;

use crate::{
    cache::ArtifactSource,
    config::LauncherConfig,
    launcher::{Launcher, RefreshOutcome},
};

pub mod args;
pub mod profile;

pub use args::{CliCommand, Command, LaunchArgs, LaunchProfileArgs, ParsedCommand};
pub use profile::{build_launch_args, resolve_config_path, LaunchProfile};

/// Execute a reporting command over HTTP and return a user-facing JSON payload.
pub async fn execute_cli_command(command: CliCommand, config: LauncherConfig) -> Result<String> {
    let launcher = Launcher::from_config(config)?;
    execute_with_launcher(command, &launcher).await
}

/// Execute a reporting command against an already built launcher.
pub async fn execute_with_launcher<S: ArtifactSource>(
    command: CliCommand,
    launcher: &Launcher<S>,
) -> Result<String> {
    match command {
        CliCommand::Check => check_payload(launcher).await,
        CliCommand::Credentials => credentials_payload(launcher),
    }
}

/// Run the freshness check only and describe the result.
async fn check_payload<S: ArtifactSource>(launcher: &Launcher<S>) -> Result<String> {
    let outcome = launcher.refresh().await?;
    let artifact = launcher.artifact();

    let (digest, message) = match &outcome {
        RefreshOutcome::Fresh(freshness) => (Some(freshness.digest().to_string()), None),
        RefreshOutcome::Stale(err) => (None, Some(err.to_string())),
        RefreshOutcome::Skipped => (None, Some("offline: no check was made".to_string())),
    };

    let payload = json!({
        "status": outcome.as_str(),
        "url": artifact.remote_url,
        "path": artifact.local_path.to_string_lossy(),
        "cached": artifact.exists(),
        "digest": digest,
        "message": message,
    });

    Ok(serde_json::to_string_pretty(&payload)?)
}

/// List which recognized credential names resolve, and from where. Values are never printed.
fn credentials_payload<S: ArtifactSource>(launcher: &Launcher<S>) -> Result<String> {
    let store = launcher.credentials();
    let resolved = store.describe();
    let missing: Vec<&str> = launcher
        .config()
        .credentials
        .names
        .iter()
        .map(String::as_str)
        .filter(|name| resolved.iter().all(|entry| entry.name != *name))
        .collect();

    let payload = json!({
        "properties_path": store.properties_path().to_string_lossy(),
        "properties_present": store.properties_path().is_file(),
        "resolved": resolved,
        "missing": missing,
    });

    Ok(serde_json::to_string_pretty(&payload)?)
}
