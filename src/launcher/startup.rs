use std::process::ExitCode;

use anyhow::Error;
use tracing::Instrument;

use crate::{
    cli::LaunchProfile,
    config::LauncherConfig,
    launcher::{LaunchedClient, Launcher},
    lib::{errors::LaunchError, telemetry::LaunchSpan},
};

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn from_launch_error(err: LaunchError) -> Self {
        let exit_code = err.exit_code();
        Self {
            message: format!("{:?}", Error::new(err)),
            exit_code,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<LaunchError> for RuntimeExit {
    fn from(value: LaunchError) -> Self {
        Self::from_launch_error(value)
    }
}

/// Refresh the artifact and start the client, then return without waiting for it.
pub async fn run_launcher(
    profile: LaunchProfile,
    config: LauncherConfig,
) -> Result<(), RuntimeExit> {
    let span = LaunchSpan::start("launch");
    tracing::info!(
        target: "inspector_launcher::launch",
        run_id = %span.run_id(),
        launch_args = ?profile.launch_args,
        "Starting launcher"
    );

    let result = launch(&profile, config)
        .instrument(span.span().clone())
        .await;

    match result {
        Ok(client) => {
            tracing::info!(
                target: "inspector_launcher::launch",
                pid = client.id(),
                "Client detached; launcher exiting"
            );
            span.finish("started");
            drop(client);
            Ok(())
        }
        Err(err) => {
            span.finish("failed");
            Err(RuntimeExit::from_launch_error(err))
        }
    }
}

async fn launch(
    profile: &LaunchProfile,
    config: LauncherConfig,
) -> Result<LaunchedClient, LaunchError> {
    let launcher = Launcher::from_config(config)?;
    launcher.run(&profile.client_args).await
}
