use crate::error::RelvaultError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const STATE_FILE_NAME: &str = "relvault-state.json";

/// An `owner/name` pair identifying a repository to monitor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
}

impl RepoTarget {
    pub fn parse(reference: &str) -> Result<Self, RelvaultError> {
        let mut parts = reference.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(RelvaultError::InvalidRepository {
                reference: reference.to_string(),
                reason: "expected the form owner/name".to_string(),
            }),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Which artifacts of a release get backed up.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetSelection {
    /// Release assets only.
    Assets,
    /// Source tarball only.
    Source,
    /// Release assets plus the source tarball.
    All,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, untagged)]
pub enum RepositoryDef {
    Simple(String),
    Advanced {
        owner: String,
        name: String,
        #[serde(default)]
        assets: Option<AssetSelection>,
    },
}

impl RepositoryDef {
    pub fn target(&self) -> Result<RepoTarget, RelvaultError> {
        match self {
            Self::Simple(reference) => RepoTarget::parse(reference),
            Self::Advanced { owner, name, .. } => {
                if owner.is_empty() || name.is_empty() {
                    return Err(RelvaultError::InvalidRepository {
                        reference: format!("{owner}/{name}"),
                        reason: "owner and name must be non-empty".to_string(),
                    });
                }
                Ok(RepoTarget {
                    owner: owner.clone(),
                    name: name.clone(),
                })
            }
        }
    }

    pub fn asset_selection(&self, default: AssetSelection) -> AssetSelection {
        match self {
            Self::Simple(_) => default,
            Self::Advanced { assets, .. } => assets.unwrap_or(default),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pre-obtained API token. Requests go out unauthenticated when absent.
    #[serde(default)]
    pub token: Option<String>,
    pub repositories: Vec<RepositoryDef>,
    /// Override for GitHub Enterprise deployments.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// HTTP/HTTPS proxy URL applied to all requests.
    #[serde(default)]
    pub proxy: Option<String>,
    pub download: DownloadConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl Config {
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| self.download.path.join(STATE_FILE_NAME))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    pub path: PathBuf,
    #[serde(default = "default_asset_selection")]
    pub assets: AssetSelection,
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

fn default_asset_selection() -> AssetSelection {
    AssetSelection::All
}

fn default_parallelism() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}
