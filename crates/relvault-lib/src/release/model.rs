use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Release metadata as returned by the `releases/latest` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
}

/// An individual downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
    /// `sha256:<hex>` content digest, present on newer API responses.
    #[serde(default)]
    pub digest: Option<String>,
}

/// Subset of the repository object needed for the default-branch lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    pub default_branch: String,
}
