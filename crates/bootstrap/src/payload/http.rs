//! HTTP client for payload downloads
//!
//! Streams a response body straight into its destination file. There is no
//! temporary file, resume or retry: whatever arrives is what ends up on disk.
//! Only connecting is time-limited. A transfer runs until the server finishes
//! or drops it, since a cut-off loader would later count as installed.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use super::PayloadSource;
use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, FileOperation, Result};

/// Unauthenticated HTTP GET into a local file
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client from bootstrap configuration
    pub fn from_config(config: &BootstrapConfig) -> Result<Self> {
        Self::with_config(config.connect_timeout, &config.user_agent)
    }

    pub fn with_config(connect_timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| BootstrapError::Configuration {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    /// Download `url` to `dest_path`, overwriting any existing file
    pub async fn download_to_file(&self, url: &Url, dest_path: &Path) -> Result<u64> {
        debug!("Stream downloading: {} to {}", url, dest_path.display());

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BootstrapError::HttpRequest {
                url: url.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(BootstrapError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = fs::File::create(dest_path)
            .await
            .map_err(|e| BootstrapError::FileSystem {
                path: dest_path.to_path_buf(),
                operation: FileOperation::Create,
                source: e,
            })?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| BootstrapError::HttpRequest {
                url: url.to_string(),
                source: e,
            })?;

            file.write_all(&chunk)
                .await
                .map_err(|e| BootstrapError::FileSystem {
                    path: dest_path.to_path_buf(),
                    operation: FileOperation::Write,
                    source: e,
                })?;

            downloaded += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| BootstrapError::FileSystem {
                path: dest_path.to_path_buf(),
                operation: FileOperation::Write,
                source: e,
            })?;

        debug!("Stream download completed: {} bytes", downloaded);
        Ok(downloaded)
    }
}

#[async_trait]
impl PayloadSource for HttpClient {
    async fn fetch(&self, url: &Url, dest_path: &Path) -> Result<u64> {
        self.download_to_file(url, dest_path).await
    }
}
