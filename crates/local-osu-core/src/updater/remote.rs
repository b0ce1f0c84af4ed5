use std::future::Future;
use tracing::debug;

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};

/// Where manifests and file contents come from.
pub trait RemoteSource: Send + Sync {
    /// Raw text of the published manifest.
    fn fetch_manifest(&self) -> impl Future<Output = Result<String>> + Send;

    /// Raw bytes of one file, addressed by its manifest path.
    fn fetch_file(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Fetches from a raw-content HTTP host such as raw.githubusercontent.com.
pub struct HttpRemote {
    client: reqwest::Client,
    manifest_url: String,
    content_base_url: String,
}

impl HttpRemote {
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            client,
            manifest_url: config.manifest_url.clone(),
            content_base_url: config.content_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl RemoteSource for HttpRemote {
    async fn fetch_manifest(&self) -> Result<String> {
        let bytes = self.get(&self.manifest_url).await?;
        String::from_utf8(bytes)
            .map_err(|e| Error::InvalidManifest(format!("manifest is not UTF-8: {}", e)))
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.content_base_url, path.trim_start_matches('/'));
        self.get(&url).await
    }
}
