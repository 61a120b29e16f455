//! Entry point for the inspector launcher.
use std::process::ExitCode;

use clap::Parser;
use inspector_launcher::{
    cli::{execute_cli_command, CliCommand, LaunchProfile, LaunchProfileArgs, ParsedCommand},
    config::LauncherConfig,
    launcher::{run_launcher, RuntimeExit},
    lib::{errors::LaunchError, telemetry},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = LaunchProfileArgs::parse();
    let command = args.into_command().map_err(RuntimeExit::from_error)?;
    let config = load_config(command.profile())?;

    match command {
        ParsedCommand::Launch(profile) => run_launcher(profile, config).await,
        ParsedCommand::Cli(_, command) => handle_cli_command(command, config).await,
    }
}

fn load_config(profile: &LaunchProfile) -> Result<LauncherConfig, RuntimeExit> {
    LauncherConfig::load(profile.config_path.clone())
        .and_then(|config| config.apply_overrides(profile.overrides.clone()))
        .map_err(|err| RuntimeExit::from_launch_error(LaunchError::Config(err)))
}

async fn handle_cli_command(
    command: CliCommand,
    config: LauncherConfig,
) -> Result<(), RuntimeExit> {
    let message = execute_cli_command(command, config)
        .await
        .map_err(RuntimeExit::from_error)?;
    println!("{message}");
    Ok(())
}
