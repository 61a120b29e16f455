use std::path::Path;

use anyhow::Result;
use httpmock::{prelude::*, Mock};
use inspector_launcher::config::{ConfigOverrides, LauncherConfig, StalePolicy};
use tokio::net::TcpListener;

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_inspector-launcher");
pub const ARTIFACT_PATH: &str = "/client.jar";

/// Answer every GET of the artifact path with `status` and `body`.
pub async fn serve_artifact<'a>(server: &'a MockServer, status: u16, body: &[u8]) -> Mock<'a> {
    let body = body.to_vec();
    server
        .mock_async(|when, then| {
            when.method(GET).path(ARTIFACT_PATH);
            then.status(status).body(body);
        })
        .await
}

pub fn artifact_url(server: &MockServer) -> String {
    server.url(ARTIFACT_PATH)
}

/// An address that refuses connections: bind, read the port, then close.
pub async fn closed_port_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}{ARTIFACT_PATH}"))
}

/// Configuration rooted in `dir` and pointed at `url`, independent of the real home directory.
pub fn config_in(dir: &Path, url: &str, policy: StalePolicy) -> Result<LauncherConfig> {
    let config = LauncherConfig::defaults(dir)?.apply_overrides(ConfigOverrides {
        url: Some(url.to_string()),
        cache_dir: Some(dir.join("cache")),
        credentials_path: Some(dir.join("credentials.properties")),
        on_check_failure: Some(policy),
        offline: false,
    })?;
    Ok(config)
}
