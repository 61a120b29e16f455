use std::{fs, time::Duration};

use anyhow::Result;
use inspector_launcher::{
    config::StalePolicy,
    credentials::CredentialSet,
    launcher::{LaunchSpec, Launcher},
    lib::errors::{LaunchError, SpawnError},
};
use httpmock::MockServer;
use tempfile::tempdir;
use tokio::time::timeout;

use crate::common::{artifact_url, config_in, serve_artifact};

const SCRIPT: &str = "printf '%s' \"$INSPECTOR_IT_TOKEN\" > token.txt; pwd > cwd.txt; \
                      printf '%s' \"$0 $1\" > args.txt";

#[cfg(unix)]
#[tokio::test]
async fn client_starts_in_cache_dir_with_file_credentials() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = serve_artifact(&server, 200, b"client-v1").await;
    let temp = tempdir()?;
    fs::write(
        temp.path().join("credentials.properties"),
        "INSPECTOR_IT_TOKEN = from-file\nINSPECTOR_IT_UNUSED=ignored\n",
    )?;

    let mut config = config_in(temp.path(), &artifact_url(&server), StalePolicy::Abort)?;
    config.credentials.names = vec!["INSPECTOR_IT_TOKEN".into()];
    config.launch.program = Some("sh".into());
    config.launch.program_args = vec!["-c".into(), SCRIPT.into()];
    let launcher = Launcher::from_config(config)?;

    let client = launcher.run(&["--debug".to_string()]).await?;
    assert!(client.id().is_some(), "a started client has a pid");
    let status = timeout(Duration::from_secs(10), client.into_child().wait()).await??;
    assert!(status.success(), "client exited with {status:?}");

    let cache_dir = temp.path().join("cache");
    assert_eq!(fs::read(cache_dir.join("RuneLite.jar"))?, b"client-v1");
    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(fs::read_to_string(cache_dir.join("token.txt"))?, "from-file");
    assert_eq!(
        fs::read_to_string(cache_dir.join("cwd.txt"))?.trim_end(),
        fs::canonicalize(&cache_dir)?.display().to_string()
    );
    assert_eq!(
        fs::read_to_string(cache_dir.join("args.txt"))?,
        format!("{} --debug", cache_dir.join("RuneLite.jar").display())
    );
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() -> Result<()> {
    let temp = tempdir()?;
    let spec = LaunchSpec {
        program: temp.path().join("no-such-runtime"),
        arguments: vec!["-jar".into()],
        working_directory: temp.path().to_path_buf(),
        environment: CredentialSet::default(),
    };

    let error = spec.spawn().expect_err("program does not exist");

    assert!(matches!(error, SpawnError::Spawn { .. }));
    assert!(error.to_string().contains("no-such-runtime"));
    Ok(())
}

#[tokio::test]
async fn failed_check_never_starts_the_client() -> Result<()> {
    let server = MockServer::start_async().await;
    let _mock = serve_artifact(&server, 500, b"").await;
    let temp = tempdir()?;
    let mut config = config_in(temp.path(), &artifact_url(&server), StalePolicy::Abort)?;
    config.launch.program = Some("sh".into());
    config.launch.program_args = vec!["-c".into(), "touch started.txt".into()];
    let launcher = Launcher::from_config(config)?;

    let error = launcher.run(&[]).await.expect_err("check fails");

    assert!(matches!(error, LaunchError::Fetch(_)));
    assert!(!temp.path().join("cache").join("started.txt").exists());
    Ok(())
}
