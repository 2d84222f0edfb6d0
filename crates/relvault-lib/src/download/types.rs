use crate::verification::{AssetDigest, VerificationError};
use std::path::PathBuf;
use thiserror::Error;

/// One asset to retrieve: where from, where to, and what to verify.
#[derive(Clone, Debug)]
pub struct DownloadTask {
    pub url: String,
    pub file_name: String,
    pub dest_path: PathBuf,
    pub expected_size: Option<u64>,
    pub expected_digest: Option<AssetDigest>,
}

/// Failure of a single download attempt. All variants are retryable; the
/// engine converts exhausted retries into a failed task outcome.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("downloaded file is empty")]
    EmptyFile,

    #[error(transparent)]
    Digest(#[from] VerificationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub enum TaskStatus {
    Completed { bytes: u64 },
    Failed { attempts: usize, reason: String },
}

#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub file_name: String,
    pub status: TaskStatus,
}

impl TaskOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, TaskStatus::Completed { .. })
    }
}

/// Per-task results of one release's download phase.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::succeeded)
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                TaskStatus::Completed { bytes } => bytes,
                TaskStatus::Failed { .. } => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(name: &str, bytes: u64) -> TaskOutcome {
        TaskOutcome {
            file_name: name.to_string(),
            status: TaskStatus::Completed { bytes },
        }
    }

    fn failed(name: &str) -> TaskOutcome {
        TaskOutcome {
            file_name: name.to_string(),
            status: TaskStatus::Failed {
                attempts: 3,
                reason: "HTTP 500".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_report_is_complete() {
        assert!(DownloadReport::default().is_complete());
    }

    #[test]
    fn test_report_accounting() {
        let report = DownloadReport {
            outcomes: vec![completed("a.tar.gz", 1000), failed("b.bin"), completed("c", 24)],
        };
        assert!(!report.is_complete());
        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.bytes_transferred(), 1024);
    }

    #[test]
    fn test_all_succeeded_is_complete() {
        let report = DownloadReport {
            outcomes: vec![completed("a", 1), completed("b", 2)],
        };
        assert!(report.is_complete());
        assert_eq!(report.failed_count(), 0);
    }
}
