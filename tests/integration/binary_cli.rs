use std::{fs, path::Path};

use anyhow::Result;
use httpmock::MockServer;
use tempfile::tempdir;
use tokio::process::Command;

use crate::common::{artifact_url, serve_artifact, BINARY_PATH};

fn write_config(dir: &Path, url: &str) -> Result<std::path::PathBuf> {
    let path = dir.join("config.toml");
    fs::write(
        &path,
        format!(
            "[artifact]\nurl = \"{url}\"\ncache_dir = \"{}\"\n\n[credentials]\ndir = \"{}\"\n",
            dir.join("cache").display(),
            dir.display()
        ),
    )?;
    Ok(path)
}

#[tokio::test]
async fn check_subcommand_prints_json_status() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = serve_artifact(&server, 200, b"client-v1").await;
    let temp = tempdir()?;
    let config = write_config(temp.path(), &artifact_url(&server))?;

    let output = Command::new(BINARY_PATH)
        .arg("--config")
        .arg(&config)
        .arg("check")
        .env_remove("LAUNCHER_CONFIG_PATH")
        .env_remove("LAUNCHER_CREDENTIALS_PATH")
        .output()
        .await?;

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(payload["status"], "installed");
    assert_eq!(payload["cached"], true);
    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(
        fs::read(temp.path().join("cache").join("RuneLite.jar"))?,
        b"client-v1"
    );
    Ok(())
}

#[tokio::test]
async fn invalid_config_exits_with_config_code() -> Result<()> {
    let temp = tempdir()?;
    let config = temp.path().join("config.toml");
    fs::write(&config, "[artifact]\nurl = \"ftp://example.invalid/client.jar\"\n")?;

    let output = Command::new(BINARY_PATH)
        .arg("--config")
        .arg(&config)
        .arg("check")
        .env_remove("LAUNCHER_CONFIG_PATH")
        .output()
        .await?;

    assert_eq!(output.status.code(), Some(78));
    assert!(String::from_utf8_lossy(&output.stderr).contains("artifact.url"));
    Ok(())
}

#[tokio::test]
async fn missing_named_config_is_an_error() -> Result<()> {
    let temp = tempdir()?;

    let output = Command::new(BINARY_PATH)
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .arg("credentials")
        .env_remove("LAUNCHER_CONFIG_PATH")
        .output()
        .await?;

    assert_eq!(output.status.code(), Some(78));
    Ok(())
}
