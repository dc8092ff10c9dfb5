//! Remote store collaborator.
//!
//! The download pipeline only talks to the store through [`AppStore`] and the
//! per-request [`StoreSession`] it opens. [`HttpStore`] implements the contract
//! against a JSON store gateway:
//!
//!   GET {base_url}/details?doc={package}   : app details, 404 when unknown
//!   GET {base_url}/download?doc={package}  : APK bytes

use std::path::Path;
use std::time::Duration;

use apkd_common::config::StoreConfig;
use apkd_common::{StoreError, StoreResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

/// Factory for per-request store sessions.
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Open a fresh session. Sessions are never shared between requests.
    async fn open_session(&self) -> StoreResult<Box<dyn StoreSession>>;
}

/// Operations available within one store session.
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Fetch the raw details document for `package`.
    ///
    /// `Ok(None)` means the store has no such application.
    async fn fetch_details(&self, package: &str) -> StoreResult<Option<RawDetails>>;

    /// Download the APK for `package` into `destination`.
    ///
    /// Returns `true` only if the whole artifact was written.
    async fn download_artifact(&self, package: &str, destination: &Path) -> StoreResult<bool>;
}

// ─── Wire types ──────────────────────────────────────────────

/// Details document as the store returns it. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetails {
    #[serde(default)]
    pub docid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub details: Option<RawDetailsBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetailsBody {
    #[serde(default, rename = "appDetails")]
    pub app_details: Option<RawAppDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppDetails {
    #[serde(default)]
    pub version_code: Option<i64>,
    #[serde(default)]
    pub version_string: Option<String>,
}

// ─── HTTP gateway client ─────────────────────────────────────

/// Store client speaking to a JSON store gateway over HTTP.
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStore {
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Session(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl AppStore for HttpStore {
    async fn open_session(&self) -> StoreResult<Box<dyn StoreSession>> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
        }))
    }
}

struct HttpSession {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSession {
    fn get(&self, endpoint: &str, package: &str) -> (String, reqwest::RequestBuilder) {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.client.get(&url).query(&[("doc", package)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        (url, request)
    }
}

#[async_trait]
impl StoreSession for HttpSession {
    async fn fetch_details(&self, package: &str) -> StoreResult<Option<RawDetails>> {
        let (url, request) = self.get("details", package);
        let resp = request.send().await.map_err(|e| transport(&url, e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(package, "Store has no details for package");
                Ok(None)
            }
            status if !status.is_success() => Err(StoreError::Status {
                url,
                status: status.as_u16(),
            }),
            _ => resp
                .json::<RawDetails>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Protocol(format!("Invalid details document: {}", e))),
        }
    }

    async fn download_artifact(&self, package: &str, destination: &Path) -> StoreResult<bool> {
        let (url, request) = self.get("download", package);
        let resp = request.send().await.map_err(|e| transport(&url, e))?;

        if !resp.status().is_success() {
            tracing::warn!(package, status = resp.status().as_u16(), "Store refused download");
            return Ok(false);
        }

        let expected = resp.content_length();
        let written = match write_body(resp, &url, destination).await {
            Ok(n) => n,
            Err(e) => {
                discard_partial(destination).await;
                return Err(e);
            }
        };

        // hyper already fails the stream on a short body; this covers
        // transports that end cleanly without delivering Content-Length bytes.
        if let Some(expected) = expected {
            if written != expected {
                tracing::warn!(package, expected, written, "Truncated download");
                discard_partial(destination).await;
                return Ok(false);
            }
        }

        tracing::debug!(package, bytes = written, path = %destination.display(), "Artifact written");
        Ok(true)
    }
}

async fn write_body(resp: reqwest::Response, url: &str, destination: &Path) -> StoreResult<u64> {
    let mut file = tokio::fs::File::create(destination).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| transport(url, e))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

async fn discard_partial(destination: &Path) {
    if let Err(e) = tokio::fs::remove_file(destination).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %destination.display(), "Failed to remove partial download: {}", e);
        }
    }
}

fn transport(url: &str, err: reqwest::Error) -> StoreError {
    StoreError::Transport {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
