use std::{fs, time::Duration};

use anyhow::Result;
use httpmock::prelude::*;
use inspector_launcher::{
    cache::{ArtifactCache, Freshness, HttpSource},
    config::StalePolicy,
    launcher::{Launcher, RefreshOutcome},
    lib::{
        digest::digest_bytes,
        errors::{FetchError, LaunchError},
    },
};
use tempfile::tempdir;

use crate::common::{artifact_url, closed_port_url, config_in, serve_artifact, ARTIFACT_PATH};

fn http_cache() -> ArtifactCache<HttpSource> {
    ArtifactCache::new(HttpSource::new(5, 30).expect("http client"))
}

#[tokio::test]
async fn cache_follows_remote_updates() -> Result<()> {
    let server = MockServer::start_async().await;
    let mut v1 = serve_artifact(&server, 200, b"client-v1").await;
    let temp = tempdir()?;
    let local = temp.path().join("client.jar");
    let cache = http_cache();
    let url = artifact_url(&server);

    let first = cache.ensure_fresh(&url, &local).await?;
    assert!(matches!(first, Freshness::Installed { .. }));
    assert_eq!(fs::read(&local)?, b"client-v1");

    let second = cache.ensure_fresh(&url, &local).await?;
    assert!(matches!(second, Freshness::Unchanged { .. }));
    assert_eq!(v1.hits_async().await, 2);

    v1.delete_async().await;
    let v2 = serve_artifact(&server, 200, b"client-v2").await;
    let third = cache.ensure_fresh(&url, &local).await?;
    match third {
        Freshness::Replaced { previous, current } => {
            assert_eq!(previous, digest_bytes(b"client-v1"));
            assert_eq!(current, digest_bytes(b"client-v2"));
        }
        other => panic!("expected replacement, got {other:?}"),
    }
    assert_eq!(fs::read(&local)?, b"client-v2");
    assert_eq!(v2.hits_async().await, 1);
    Ok(())
}

#[tokio::test]
async fn error_status_keeps_cached_artifact() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = serve_artifact(&server, 404, b"not found").await;
    let temp = tempdir()?;
    let local = temp.path().join("client.jar");
    fs::write(&local, b"client-v1")?;

    let error = http_cache()
        .ensure_fresh(&artifact_url(&server), &local)
        .await
        .expect_err("404 is not a valid artifact");

    assert!(matches!(error, FetchError::BadStatus { status: 404, .. }));
    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(fs::read(&local)?, b"client-v1");
    let leftovers: Vec<_> = fs::read_dir(temp.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() != "client.jar")
        .collect();
    assert!(leftovers.is_empty(), "staging files left: {leftovers:?}");
    Ok(())
}

#[tokio::test]
async fn slow_server_hits_request_timeout() -> Result<()> {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path(ARTIFACT_PATH);
            then.status(200)
                .body("client-v1")
                .delay(Duration::from_secs(5));
        })
        .await;
    let temp = tempdir()?;
    let local = temp.path().join("client.jar");
    let cache = ArtifactCache::new(HttpSource::new(1, 1)?);

    let error = cache
        .ensure_fresh(&artifact_url(&server), &local)
        .await
        .expect_err("response arrives after the timeout");

    assert!(
        matches!(error, FetchError::Timeout { timeout_secs: 1, .. }),
        "unexpected error: {error:?}"
    );
    assert!(error.is_network());
    assert!(!local.exists());
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_a_network_failure() -> Result<()> {
    let temp = tempdir()?;
    let local = temp.path().join("client.jar");

    let error = http_cache()
        .ensure_fresh(&closed_port_url().await?, &local)
        .await
        .expect_err("nothing is listening");

    assert!(error.is_network(), "unexpected error: {error:?}");
    assert!(!local.exists());
    Ok(())
}

#[tokio::test]
async fn launch_stale_policy_survives_outage() -> Result<()> {
    let temp = tempdir()?;
    let url = closed_port_url().await?;
    let launcher =
        Launcher::from_config(config_in(temp.path(), &url, StalePolicy::LaunchStale)?)?;
    fs::create_dir_all(temp.path().join("cache"))?;
    fs::write(&launcher.artifact().local_path, b"client-v1")?;

    let outcome = launcher.refresh().await?;

    assert!(matches!(outcome, RefreshOutcome::Stale(_)));
    assert_eq!(fs::read(&launcher.artifact().local_path)?, b"client-v1");
    Ok(())
}

#[tokio::test]
async fn abort_policy_refuses_outage() -> Result<()> {
    let temp = tempdir()?;
    let url = closed_port_url().await?;
    let launcher = Launcher::from_config(config_in(temp.path(), &url, StalePolicy::Abort)?)?;
    fs::create_dir_all(temp.path().join("cache"))?;
    fs::write(&launcher.artifact().local_path, b"client-v1")?;

    let error = launcher.refresh().await.expect_err("abort on outage");

    assert!(matches!(error, LaunchError::Fetch(_)));
    Ok(())
}
