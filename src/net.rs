// HTTP plumbing shared by the pipeline stages

use std::path::Path;

use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::config::ResolverConfig;
use crate::errors::ResolveError;

/// Pinned browser identity. Reddit serves degraded JSON to unknown agents.
pub const FAKE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Paired HTTP clients: `api` enforces the metadata timeout; `media` has
/// none and serves size probes and file downloads.
#[derive(Debug, Clone)]
pub struct HttpClients {
    pub api: Client,
    pub media: Client,
}

impl HttpClients {
    pub fn new(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let api = Client::builder()
            .user_agent(FAKE_USER_AGENT)
            .timeout(config.metadata_timeout)
            .build()
            .map_err(|err| ResolveError::FetchFailure(format!("client setup: {}", err)))?;
        let media = Client::builder()
            .user_agent(FAKE_USER_AGENT)
            .build()
            .map_err(|err| ResolveError::FetchFailure(format!("client setup: {}", err)))?;
        Ok(Self { api, media })
    }

    /// Issues a HEAD request and reads the Content-Length header, in
    /// mebibytes rounded to one decimal.
    ///
    /// A missing header counts as zero bytes; an unreadable header or a
    /// failed request yields `None` so the caller can drop the candidate.
    pub async fn probe_size_mb(&self, url: &str) -> Option<f64> {
        let response = self.media.head(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let bytes = match response.headers().get(CONTENT_LENGTH) {
            Some(value) => value.to_str().ok()?.trim().parse::<u64>().ok()?,
            None => 0,
        };
        Some(round_mb(bytes))
    }

    /// Streams `url` into `path`, reporting success as a flag.
    pub async fn download_to(&self, url: &str, path: &Path) -> bool {
        match self.try_download(url, path).await {
            Ok(()) => true,
            Err(err) => {
                warn!(url, error = %err, "download failed");
                false
            }
        }
    }

    async fn try_download(&self, url: &str, path: &Path) -> Result<(), ResolveError> {
        let response = self
            .media
            .get(url)
            .send()
            .await
            .map_err(|err| ResolveError::DownloadFailure(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ResolveError::DownloadFailure(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| ResolveError::DownloadFailure(err.to_string()))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    /// Resolves `url` through any redirects and returns the final address.
    ///
    /// Tries a cheap HEAD first; some hosts reject HEAD, so a full GET is
    /// the fallback before giving up.
    pub async fn final_url(&self, url: &str) -> Result<String, ResolveError> {
        if let Some(resolved) = self.head_final(url).await {
            return Ok(resolved);
        }
        match self.get_final(url).await {
            Some(resolved) => Ok(resolved),
            None => Err(ResolveError::FetchFailure(format!(
                "could not resolve final URL for {}",
                url
            ))),
        }
    }

    async fn head_final(&self, url: &str) -> Option<String> {
        let response = self.api.head(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        Some(response.url().to_string())
    }

    async fn get_final(&self, url: &str) -> Option<String> {
        let response = self.api.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        Some(response.url().to_string())
    }
}

fn round_mb(bytes: u64) -> f64 {
    let mb = bytes as f64 / 1_048_576.0;
    (mb * 10.0).round() / 10.0
}
