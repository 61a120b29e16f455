//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use super::{build_launch_args, resolve_config_path, LaunchProfile};
use crate::config::{ConfigOverrides, StalePolicy};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    Launch(LaunchProfile),
    Cli(LaunchProfile, CliCommand),
}

impl ParsedCommand {
    pub fn profile(&self) -> &LaunchProfile {
        match self {
            ParsedCommand::Launch(profile) | ParsedCommand::Cli(profile, _) => profile,
        }
    }
}

/// Top-level CLI commands. Without one the launcher refreshes and starts the client.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Refresh the cached artifact and start the client (default).
    Launch(LaunchArgs),
    /// Only run the freshness check and print the result.
    Check,
    /// Show which credential variables would be passed to the client.
    Credentials,
}

/// Commands that report instead of launching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    Check,
    Credentials,
}

/// Arguments for `launch`.
#[derive(Debug, Clone, Default, Args)]
pub struct LaunchArgs {
    /// Arguments passed through to the client, after `--`.
    #[arg(last = true)]
    pub client_args: Vec<String>,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Keeps the inspector client up to date and starts it with launcher credentials",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Path to config.toml (overrides LAUNCHER_CONFIG_PATH).
    #[arg(long = "config", global = true)]
    pub config_override: Option<PathBuf>,
    /// Download URL of the client artifact.
    #[arg(long, global = true)]
    pub url: Option<String>,
    /// Directory holding the cached artifact.
    #[arg(long = "cache-dir", global = true)]
    pub cache_dir: Option<PathBuf>,
    /// Credentials properties file (overrides LAUNCHER_CREDENTIALS_PATH).
    #[arg(long = "credentials", global = true)]
    pub credentials_path: Option<PathBuf>,
    /// What to do when the freshness check fails.
    #[arg(long = "on-check-failure", value_enum, global = true)]
    pub on_check_failure: Option<StalePolicy>,
    /// Skip the freshness check and start the cached artifact.
    #[arg(long, default_value_t = false, global = true)]
    pub offline: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl LaunchProfileArgs {
    /// Build a `LaunchProfile` from CLI args.
    pub fn build(self, client_args: Vec<String>) -> Result<LaunchProfile> {
        let config_path = self.config_override.map(resolve_config_path).transpose()?;
        let overrides = ConfigOverrides {
            url: self.url,
            cache_dir: self.cache_dir,
            credentials_path: self.credentials_path,
            on_check_failure: self.on_check_failure,
            offline: self.offline,
        };
        let launch_args = build_launch_args(config_path.as_deref(), &overrides);

        Ok(LaunchProfile {
            config_path,
            overrides,
            client_args,
            launch_args,
        })
    }

    /// Parse CLI args into either launch mode or a reporting command.
    pub fn into_command(mut self) -> Result<ParsedCommand> {
        let (client_args, cli) = match self.command.take() {
            None => (Vec::new(), None),
            Some(Command::Launch(args)) => (args.client_args, None),
            Some(Command::Check) => (Vec::new(), Some(CliCommand::Check)),
            Some(Command::Credentials) => (Vec::new(), Some(CliCommand::Credentials)),
        };
        let profile = self.build(client_args)?;

        Ok(match cli {
            Some(command) => ParsedCommand::Cli(profile, command),
            None => ParsedCommand::Launch(profile),
        })
    }
}
