use crate::config::RepoTarget;
use std::fmt;

/// Terminal state of one repository's backup cycle.
#[derive(Debug, Clone)]
pub enum RepoOutcome {
    /// Stored state already matches the latest release, or there is none.
    UpToDate { tag: Option<String> },
    /// Every artifact of the release was downloaded and verified.
    Completed { tag: String, assets: usize, bytes: u64 },
    /// At least one artifact failed all attempts; stored state untouched.
    PartiallyFailed { tag: String, failed: usize, total: usize },
    /// The repository could not be checked this cycle.
    CheckFailed { reason: String },
}

impl RepoOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::UpToDate { .. } | Self::Completed { .. })
    }
}

impl fmt::Display for RepoOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate { tag: Some(tag) } => write!(f, "up to date at {tag}"),
            Self::UpToDate { tag: None } => write!(f, "up to date (no releases)"),
            Self::Completed { tag, assets, bytes } => {
                write!(f, "downloaded {assets} artifacts ({bytes} bytes) for {tag}")
            }
            Self::PartiallyFailed { tag, failed, total } => {
                write!(f, "failed {failed} of {total} artifacts for {tag}")
            }
            Self::CheckFailed { reason } => write!(f, "check failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepoReport {
    pub repo: RepoTarget,
    pub outcome: RepoOutcome,
}

/// Per-repository outcomes of one whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub repositories: Vec<RepoReport>,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|report| !report.outcome.is_clean())
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }
}
