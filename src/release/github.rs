//! GitHub REST API client.

use crate::constants::{
    API_REQUEST_TIMEOUT, CONNECT_TIMEOUT, DEFAULT_API_URL, DOWNLOAD_INACTIVITY_TIMEOUT,
    MAX_BACKOFF_DELAY_MS, MAX_NETWORK_RETRIES, STARTING_BACKOFF_DELAY_MS, TOKEN_ENV_VARS,
};
use crate::core::{ExecmanError, Result};
use crate::release::{Asset, ReleaseDescriptor, ReleaseHost};
use crate::utils::progress::ProgressBar;
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Deserialize, Debug)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

impl From<GithubRelease> for ReleaseDescriptor {
    fn from(release: GithubRelease) -> Self {
        Self {
            tag: release.tag_name,
            is_prerelease: release.prerelease,
            assets: release
                .assets
                .into_iter()
                .map(|a| Asset {
                    name: a.name,
                    download_url: a.browser_download_url,
                    size: a.size,
                })
                .collect(),
        }
    }
}

/// [`ReleaseHost`] backed by the GitHub REST API.
///
/// Sends `GITHUB_TOKEN` (or `GH_TOKEN`) as a bearer token when set, which
/// raises the anonymous rate limit and grants access to private repositories.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    /// Creates a client for the given API base URL.
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = token_from_env() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("Ignoring unusable GitHub token: {e}"),
            }
        }

        let client = reqwest::Client::builder()
            .user_agent(format!("execman/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ExecmanError::network("create HTTP client", e))?;

        Ok(Self {
            client,
            api_url,
        })
    }

    /// A client for `https://api.github.com`.
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_API_URL)
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `{api_url}/{segments...}` with each segment percent-encoded, so a tag
    /// holding `/`, `#` or `?` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let operation = "build release API URL";
        let mut url =
            reqwest::Url::parse(&self.api_url).map_err(|e| ExecmanError::network(operation, e))?;
        url.path_segments_mut()
            .map_err(|()| ExecmanError::network(operation, format!("{} cannot be a base URL", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// GETs and decodes `url`, retrying transient failures.
    ///
    /// A 404 becomes [`ExecmanError::ReleaseNotFound`] for `version` and is
    /// never retried.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        repository: &str,
        version: Option<&str>,
    ) -> Result<T> {
        let strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .factor(2)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(MAX_NETWORK_RETRIES);

        RetryIf::spawn(
            strategy,
            || self.get_json_once(&url, repository, version),
            |e: &ExecmanError| {
                if e.is_transient() {
                    debug!("Retrying {url} after: {e}");
                }
                e.is_transient()
            },
        )
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &str,
        repository: &str,
        version: Option<&str>,
    ) -> Result<T> {
        let operation = format!("fetch release metadata for {repository}");
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .timeout(API_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ExecmanError::network(&operation, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExecmanError::ReleaseNotFound {
                repository: repository.to_string(),
                version: version.map(str::to_string),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecmanError::network(operation, api_error_message(status, &body)));
        }

        response.json::<T>().await.map_err(|e| ExecmanError::network(operation, e))
    }
}

fn token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Prefers the `message` field of a GitHub error body over the raw body.
fn api_error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }

    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => format!("HTTP {status}: {}", err.message),
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => format!("HTTP {status}: {}", body.trim()),
    }
}

impl ReleaseHost for GithubClient {
    async fn latest_release(
        &self,
        owner: &str,
        repo: &str,
        include_prereleases: bool,
    ) -> Result<ReleaseDescriptor> {
        let repository = format!("{owner}/{repo}");

        if !include_prereleases {
            let url = self.endpoint(&["repos", owner, repo, "releases", "latest"])?;
            let release: GithubRelease = self.get_json(url, &repository, None).await?;
            return Ok(release.into());
        }

        // The list endpoint is ordered by publication, newest first.
        let url = self.endpoint(&["repos", owner, repo, "releases"])?;
        let releases: Vec<GithubRelease> = self.get_json(url, &repository, None).await?;
        releases.into_iter().find(|r| !r.draft).map(Into::into).ok_or(
            ExecmanError::ReleaseNotFound {
                repository,
                version: None,
            },
        )
    }

    async fn release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<ReleaseDescriptor> {
        let repository = format!("{owner}/{repo}");
        let url = self.endpoint(&["repos", owner, repo, "releases", "tags", tag])?;
        let release: GithubRelease = self.get_json(url, &repository, Some(tag)).await?;
        Ok(release.into())
    }

    async fn download_asset(&self, asset: &Asset, dest: &Path, progress: &ProgressBar) -> Result<u64> {
        let operation = format!("download {}", asset.name);
        debug!("Downloading {} from {}", asset.name, asset.download_url);

        let response = self
            .client
            .get(&asset.download_url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|e| ExecmanError::network(&operation, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExecmanError::network(operation, format!("HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            progress.set_length(len);
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| ExecmanError::io("create", dest, e))?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        loop {
            let chunk = match tokio::time::timeout(DOWNLOAD_INACTIVITY_TIMEOUT, stream.next()).await
            {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(Some(Err(e))) => return Err(ExecmanError::network(&operation, e)),
                Ok(None) => break,
                Err(_) => {
                    return Err(ExecmanError::network(
                        &operation,
                        format!(
                            "no data received for {} seconds after {downloaded} bytes",
                            DOWNLOAD_INACTIVITY_TIMEOUT.as_secs()
                        ),
                    ));
                }
            };

            file.write_all(&chunk).await.map_err(|e| ExecmanError::io("write", dest, e))?;
            downloaded += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }

        file.flush().await.map_err(|e| ExecmanError::io("flush", dest, e))?;
        debug!("Downloaded {downloaded} bytes to {}", dest.display());
        Ok(downloaded)
    }
}
