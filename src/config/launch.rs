use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_PROGRAM: &str = "java";
pub const DEFAULT_PROGRAM_ARGS: &[&str] = &["-jar"];

/// How the cached artifact is started.
#[derive(Debug, Clone)]
pub struct LaunchSection {
    /// Runtime used to start the artifact; `None` runs the artifact directly.
    pub program: Option<String>,
    pub program_args: Vec<String>,
    pub client_args: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLaunchSection {
    pub program: Option<String>,
    pub program_args: Option<Vec<String>>,
    pub client_args: Option<Vec<String>>,
}

pub fn parse_launch_section(
    raw: Option<RawLaunchSection>,
    path: &Path,
) -> Result<LaunchSection, ConfigError> {
    let raw = raw.unwrap_or_default();

    let program = match raw.program {
        Some(program) if program.trim().is_empty() => None,
        Some(program) => Some(program),
        None => Some(DEFAULT_PROGRAM.to_string()),
    };

    let program_args = match (&program, raw.program_args) {
        (_, Some(args)) => args,
        (Some(_), None) => DEFAULT_PROGRAM_ARGS.iter().map(|a| a.to_string()).collect(),
        (None, None) => Vec::new(),
    };
    if program.is_none() && !program_args.is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "launch.program_args",
            message: "program_args require launch.program to be set".into(),
        });
    }

    Ok(LaunchSection {
        program,
        program_args,
        client_args: raw.client_args.unwrap_or_default(),
    })
}
