//! Remote side of the freshness check.

use std::{future::Future, time::Duration};

use tracing::debug;

use crate::lib::errors::FetchError;

use super::StagedDownload;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Something that can stream the artifact bytes for a URL.
pub trait ArtifactSource {
    /// Write the full artifact at `url` into `sink`.
    fn fetch_into(
        &self,
        url: &str,
        sink: &mut StagedDownload,
    ) -> impl Future<Output = Result<(), FetchError>>;
}

/// Plain HTTP(S) GET without conditional headers.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpSource {
    pub fn new(connect_timeout_secs: u64, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            FetchError::Unreachable {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

impl ArtifactSource for HttpSource {
    async fn fetch_into(&self, url: &str, sink: &mut StagedDownload) -> Result<(), FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.classify(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(
            target: "inspector_launcher::cache",
            url,
            status = status.as_u16(),
            content_length = response.content_length(),
            "Downloading artifact"
        );

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| self.classify(url, err))?
        {
            sink.write_chunk(&chunk)?;
        }
        Ok(())
    }
}
