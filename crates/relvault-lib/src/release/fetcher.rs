use super::model::{Release, RepositoryInfo};
use crate::config::{Config, RepoTarget};
use crate::error::RelvaultError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

const API_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT_VALUE: &str = concat!("relvault/", env!("CARGO_PKG_VERSION"));
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("authentication rejected by the API (HTTP {status})")]
    Auth { status: u16 },

    #[error("repository or release not found")]
    NotFound,

    #[error("API rate limit exhausted{}", .retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    #[error("transient API failure: {reason}")]
    Transient { reason: String },
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::Transient { reason }
    }
}

/// Shared HTTP client carrying token, user agent, proxy and the global
/// per-request timeout. Used for both metadata fetches and asset downloads.
pub fn build_client(config: &Config) -> Result<Client, RelvaultError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    if let Some(token) = &config.token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| RelvaultError::Auth {
                details: "token contains characters not valid in an HTTP header".to_string(),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(config.download.timeout());

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    builder.build().map_err(Into::into)
}

/// Read-only client for release metadata. Never sleeps; rate-limit hints are
/// surfaced to the caller.
#[derive(Clone)]
pub struct ReleaseFetcher {
    client: Client,
    api_base_url: String,
}

impl ReleaseFetcher {
    pub fn new(client: Client, api_base_url: &str) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Latest published release of the repository.
    pub async fn fetch_latest(&self, repo: &RepoTarget) -> Result<Release, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base_url, repo.owner, repo.name
        );
        self.get_json(&url).await
    }

    /// Name of the repository's default branch.
    pub async fn fetch_default_branch(&self, repo: &RepoTarget) -> Result<String, FetchError> {
        let url = format!("{}/repos/{}/{}", self.api_base_url, repo.owner, repo.name);
        let info: RepositoryInfo = self.get_json(&url).await?;
        Ok(info.default_branch)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, API_ACCEPT)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let response = check_status(response)?;
        response.json::<T>().await.map_err(|e| FetchError::Transient {
            reason: format!("malformed API response: {e}"),
        })
    }
}

fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(classify_error_status(status, response.headers()))
    }
}

fn classify_error_status(status: StatusCode, headers: &HeaderMap) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            retry_after: rate_limit_hint(headers),
        },
        StatusCode::FORBIDDEN if quota_exhausted(headers) => FetchError::RateLimited {
            retry_after: rate_limit_hint(headers),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Auth {
            status: status.as_u16(),
        },
        _ => FetchError::Transient {
            reason: format!("HTTP {status}"),
        },
    }
}

fn quota_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|remaining| remaining == "0")
}

/// Suspend hint from `Retry-After` (seconds) or `X-RateLimit-Reset` (epoch).
fn rate_limit_hint(headers: &HeaderMap) -> Option<Duration> {
    if let Some(seconds) = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
    {
        return Some(Duration::from_secs(seconds));
    }

    let reset = headers
        .get(RATE_LIMIT_RESET)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    Some(Duration::from_secs(reset.saturating_sub(now)))
}
