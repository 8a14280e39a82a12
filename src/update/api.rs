//! HTTP seam of the update protocol.
//!
//! [`ReleaseApi`] describes the four requests a run performs. The orchestrator is
//! generic over it so tests can drive a full run against a scripted endpoint;
//! [`HttpReleaseApi`] is the `reqwest` implementation used by the binary.

use anyhow::Result;
use reqwest::StatusCode;
use std::future::Future;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::UpdaterError;
use crate::update::release::{ReleaseCheck, ReleaseDescriptor, ReleaseRequest};
use crate::update::settings::UPDATER_VERSION;
use crate::utils::progress::ProgressBar;

const OP_BOOTSTRAP: &str = "getting the updater URI";
const OP_VERSION: &str = "getting the updater version";
const OP_RELEASE: &str = "checking the latest release";
const OP_DOWNLOAD: &str = "downloading the update";

/// Requests performed by an update run.
///
/// All URLs are absolute; build them with [`endpoint_url`].
pub trait ReleaseApi {
    /// GET the bootstrap document and return its body.
    fn fetch_bootstrap(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// GET `<endpoint>/version` and return the body verbatim.
    fn fetch_updater_version(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// POST the release request to `<endpoint>/releases/<release>`.
    fn check_release(
        &self,
        url: &str,
        request: &ReleaseRequest,
    ) -> impl Future<Output = Result<ReleaseCheck>> + Send;

    /// GET `url` and stream the body into `dest`, returning the number of bytes written.
    ///
    /// `dest` is created or truncated. On failure no partial file is left behind.
    fn download(&self, url: &str, dest: &Path) -> impl Future<Output = Result<u64>> + Send;
}

/// Joins a base URI and a relative path with exactly one `/` between them.
///
/// # Examples
///
/// ```rust
/// use egts_updater::update::endpoint_url;
///
/// assert_eq!(endpoint_url("https://api.example/", "version"), "https://api.example/version");
/// assert_eq!(endpoint_url("https://api.example", "releases/prod"), "https://api.example/releases/prod");
/// ```
#[must_use]
pub fn endpoint_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// [`ReleaseApi`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpReleaseApi {
    client: reqwest::Client,
}

impl HttpReleaseApi {
    /// Build a client identifying as `egts-updater/<version>`.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("egts-updater/{UPDATER_VERSION}"))
            .build()
            .map_err(|e| UpdaterError::Network {
                operation: "initializing the HTTP client".to_string(),
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    async fn get(&self, operation: &str, url: &str) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(operation, url, &e).into())
    }

    async fn stream_to_file(&self, mut response: reqwest::Response, url: &str, dest: &Path) -> Result<u64> {
        let fs_error = |e: std::io::Error| UpdaterError::FileSystem {
            operation: "writing the update archive".to_string(),
            path: dest.display().to_string(),
            reason: e.to_string(),
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(fs_error)?;

        let progress = ProgressBar::new_download(response.content_length());
        progress.set_prefix(
            dest.file_name().map_or_else(|| "download".into(), |n| n.to_string_lossy().into_owned()),
        );

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| network_error(OP_DOWNLOAD, url, &e))?
        {
            file.write_all(&chunk).await.map_err(fs_error)?;
            written += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }

        file.flush().await.map_err(fs_error)?;
        file.sync_all().await.map_err(fs_error)?;
        progress.finish_and_clear();

        Ok(written)
    }
}

impl ReleaseApi for HttpReleaseApi {
    async fn fetch_bootstrap(&self, url: &str) -> Result<String> {
        let response = self.get(OP_BOOTSTRAP, url).await?;
        let response = require_success(OP_BOOTSTRAP, url, response)?;
        read_text(OP_BOOTSTRAP, url, response).await
    }

    async fn fetch_updater_version(&self, url: &str) -> Result<String> {
        let response = self.get(OP_VERSION, url).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(OP_VERSION, url, response.status()).into());
        }
        read_text(OP_VERSION, url, response).await
    }

    async fn check_release(&self, url: &str, request: &ReleaseRequest) -> Result<ReleaseCheck> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| network_error(OP_RELEASE, url, &e))?;

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(ReleaseCheck::UpToDate),
            StatusCode::OK => {
                let body = response.bytes().await.map_err(|e| network_error(OP_RELEASE, url, &e))?;
                let descriptor: ReleaseDescriptor =
                    serde_json::from_slice(&body).map_err(|e| UpdaterError::ResponseDecode {
                        operation: OP_RELEASE.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(ReleaseCheck::Available(descriptor))
            }
            status => Err(status_error(OP_RELEASE, url, status).into()),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.get(OP_DOWNLOAD, url).await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(OP_DOWNLOAD, url, response.status()).into());
        }

        let result = self.stream_to_file(response, url, dest).await;
        if result.is_err() {
            match tokio::fs::remove_file(dest).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove partial download {}: {}", dest.display(), e),
            }
        }
        result
    }
}

fn network_error(operation: &str, url: &str, error: &reqwest::Error) -> UpdaterError {
    UpdaterError::Network {
        operation: operation.to_string(),
        url: url.to_string(),
        reason: error.to_string(),
    }
}

fn status_error(operation: &str, url: &str, status: StatusCode) -> UpdaterError {
    UpdaterError::UnexpectedStatus {
        operation: operation.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
    }
}

fn require_success(operation: &str, url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(operation, url, response.status()).into())
    }
}

async fn read_text(operation: &str, url: &str, response: reqwest::Response) -> Result<String> {
    let body = response.bytes().await.map_err(|e| network_error(operation, url, &e))?;
    String::from_utf8(body.to_vec()).map_err(|e| {
        UpdaterError::ResponseDecode {
            operation: operation.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
