use super::progress::ProgressObserver;
use super::types::{DownloadError, DownloadReport, DownloadTask, TaskOutcome, TaskStatus};
use crate::retry::RetryPolicy;
use crate::verification::AssetDigestVerifier;
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const PARTIAL_SUFFIX: &str = ".part";
const DOWNLOAD_ACCEPT: &str = "application/octet-stream";

/// Streams assets to disk with whole-asset retry under the configured
/// policy. Each task writes to a `.part` sibling and is renamed onto its
/// final path only after verification, so a partially-written file is never
/// visible at the destination.
pub struct DownloadEngine {
    client: Client,
    policy: RetryPolicy,
    parallelism: usize,
}

impl DownloadEngine {
    pub fn new(client: Client, policy: RetryPolicy, parallelism: usize) -> Self {
        Self {
            client,
            policy,
            parallelism: parallelism.max(1),
        }
    }

    /// Run every task to completion or retry exhaustion. One task's failure
    /// never aborts its siblings; the report carries the per-task outcomes.
    pub async fn download_all(
        &self,
        tasks: Vec<DownloadTask>,
        observer: Arc<dyn ProgressObserver>,
    ) -> DownloadReport {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.parallelism));

        let mut futs = FuturesUnordered::new();
        for task in tasks {
            let semaphore = semaphore.clone();
            let observer = observer.clone();
            futs.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                let status = self.run_task(&task, observer.as_ref()).await;
                TaskOutcome {
                    file_name: task.file_name,
                    status,
                }
            });
        }

        let mut report = DownloadReport::default();
        while let Some(outcome) = futs.next().await {
            if let TaskStatus::Failed { attempts, reason } = &outcome.status {
                warn!(
                    file = %outcome.file_name,
                    attempts,
                    reason = %reason,
                    "Download failed"
                );
            }
            report.outcomes.push(outcome);
        }
        report
    }

    async fn run_task(&self, task: &DownloadTask, observer: &dyn ProgressObserver) -> TaskStatus {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(task, observer).await {
                Ok(bytes) => {
                    info!(
                        file = %task.file_name,
                        bytes,
                        output = %task.dest_path.display(),
                        "Downloaded and verified"
                    );
                    return TaskStatus::Completed { bytes };
                }
                Err(err) => {
                    if attempts >= self.policy.max_attempts {
                        return TaskStatus::Failed {
                            attempts,
                            reason: err.to_string(),
                        };
                    }
                    let delay = self.policy.delay_for(attempts - 1);
                    debug!(
                        file = %task.file_name,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after failed attempt"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One full attempt: stream to the partial path, verify, rename into
    /// place. Any failure discards the partial file so the next attempt
    /// starts from scratch.
    async fn attempt(
        &self,
        task: &DownloadTask,
        observer: &dyn ProgressObserver,
    ) -> Result<u64, DownloadError> {
        let part_path = partial_path(&task.dest_path);

        match self.stream_to_partial(task, &part_path, observer).await {
            Ok(bytes) => {
                tokio::fs::rename(&part_path, &task.dest_path).await?;
                Ok(bytes)
            }
            Err(err) => {
                let _ = tokio::fs::remove_file(&part_path).await;
                Err(err)
            }
        }
    }

    async fn stream_to_partial(
        &self,
        task: &DownloadTask,
        part_path: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<u64, DownloadError> {
        if let Some(parent) = task.dest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(&task.url)
            .header(ACCEPT, DOWNLOAD_ACCEPT)
            .send()
            .await
            .map_err(map_transfer_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let total = task.expected_size.or_else(|| response.content_length());
        observer.on_start(&task.file_name, total);

        let mut verifier = task.expected_digest.as_ref().map(AssetDigestVerifier::new);
        let file = tokio::fs::File::create(part_path).await?;
        let mut writer = tokio::io::BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_so_far = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_transfer_error)?;
            if let Some(verifier) = verifier.as_mut() {
                verifier.update(&chunk);
            }
            writer.write_all(&chunk).await?;
            bytes_so_far += chunk.len() as u64;
            observer.on_progress(&task.file_name, bytes_so_far, total);
        }
        writer.flush().await?;

        if bytes_so_far == 0 {
            return Err(DownloadError::EmptyFile);
        }
        if let Some(expected) = task.expected_size
            && expected != bytes_so_far
        {
            return Err(DownloadError::SizeMismatch {
                expected,
                actual: bytes_so_far,
            });
        }
        if let Some(verifier) = verifier {
            verifier.verify()?;
        }

        observer.on_finish(&task.file_name, bytes_so_far);
        Ok(bytes_so_far)
    }
}

fn partial_path(dest_path: &Path) -> PathBuf {
    let mut raw = dest_path.as_os_str().to_os_string();
    raw.push(PARTIAL_SUFFIX);
    PathBuf::from(raw)
}

fn map_transfer_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        DownloadError::Timeout(err.to_string())
    } else if err.is_connect() {
        DownloadError::Connection(err.to_string())
    } else {
        DownloadError::Stream(err.to_string())
    }
}
