use tracing::{debug, info};

use super::{LauncherConfig, CONFIG_ENV_KEY};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "inspector_launcher::config",
            path = %path.display(),
            "Loading configuration using LAUNCHER_CONFIG_PATH environment variable"
        );
    } else {
        debug!(
            target: "inspector_launcher::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            "LAUNCHER_CONFIG_PATH not set; using default location"
        );
    }
}

pub fn log_loaded(config: &LauncherConfig) {
    info!(
        target: "inspector_launcher::config",
        path = %config.source_path.display(),
        url = %config.artifact.url,
        cache_dir = %config.artifact.cache_dir.display(),
        filename = %config.artifact.filename,
        timeout_secs = config.artifact.timeout_secs,
        on_check_failure = config.artifact.on_check_failure.as_str(),
        credential_names = config.credentials.names.len(),
        program = config.launch.program.as_deref().unwrap_or("<artifact>"),
        "Configuration loaded successfully"
    );
}
