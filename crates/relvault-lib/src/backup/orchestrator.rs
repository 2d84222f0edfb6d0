use super::report::{RepoOutcome, RepoReport, RunSummary};
use crate::config::{AssetSelection, RepoTarget};
use crate::download::{DownloadEngine, DownloadTask, ProgressObserver};
use crate::error::RelvaultError;
use crate::release::{FetchError, Release, ReleaseFetcher};
use crate::state::StateStore;
use crate::verification::AssetDigest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// A repository to back up, with its effective asset selection.
#[derive(Clone, Debug)]
pub struct BackupTarget {
    pub repo: RepoTarget,
    pub assets: AssetSelection,
}

/// Drives one backup cycle per repository: check the latest release against
/// stored state, download the new release's artifacts, and advance state
/// only when every artifact verified.
pub struct BackupOrchestrator {
    fetcher: ReleaseFetcher,
    engine: DownloadEngine,
    state: StateStore,
    download_dir: PathBuf,
}

impl BackupOrchestrator {
    pub fn new(
        fetcher: ReleaseFetcher,
        engine: DownloadEngine,
        state: StateStore,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            engine,
            state,
            download_dir,
        }
    }

    /// Process every target sequentially. Credential and quota failures
    /// abort the whole run; transient fetch failures are absorbed into that
    /// repository's outcome and the run continues.
    pub async fn run(
        &mut self,
        targets: &[BackupTarget],
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<RunSummary, RelvaultError> {
        let mut summary = RunSummary::default();

        for target in targets {
            info!(repo = %target.repo, "Checking for new release");
            let outcome = match self.fetcher.fetch_latest(&target.repo).await {
                Ok(release) => {
                    self.process_release(target, &release, observer.clone())
                        .await?
                }
                Err(FetchError::NotFound) => {
                    info!(repo = %target.repo, "No releases published");
                    RepoOutcome::UpToDate {
                        tag: self.state.get_last(&target.repo).map(str::to_string),
                    }
                }
                Err(FetchError::Auth { status }) => {
                    return Err(RelvaultError::Auth {
                        details: format!("API returned HTTP {status} for {}", target.repo),
                    });
                }
                Err(FetchError::RateLimited { retry_after }) => {
                    return Err(RelvaultError::RateLimited {
                        retry_after_secs: retry_after.map(|d| d.as_secs()),
                    });
                }
                Err(FetchError::Transient { reason }) => {
                    warn!(repo = %target.repo, reason = %reason, "Skipping repository this cycle");
                    RepoOutcome::CheckFailed { reason }
                }
            };

            info!(repo = %target.repo, "{}", outcome);
            summary.repositories.push(RepoReport {
                repo: target.repo.clone(),
                outcome,
            });
        }

        Ok(summary)
    }

    async fn process_release(
        &mut self,
        target: &BackupTarget,
        release: &Release,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<RepoOutcome, RelvaultError> {
        let tag = release.tag_name.clone();

        if self.state.get_last(&target.repo) == Some(tag.as_str()) {
            return Ok(RepoOutcome::UpToDate { tag: Some(tag) });
        }

        info!(repo = %target.repo, tag = %tag, "New release found");
        let tasks = build_tasks(target, release, &self.download_dir);

        if tasks.is_empty() {
            // Nothing to fetch under this selection; holding state would
            // re-announce the same release forever.
            self.state.set_last(&target.repo, &tag)?;
            return Ok(RepoOutcome::Completed {
                tag,
                assets: 0,
                bytes: 0,
            });
        }

        let report = self.engine.download_all(tasks, observer).await;
        if report.is_complete() {
            self.state.set_last(&target.repo, &tag)?;
            Ok(RepoOutcome::Completed {
                tag,
                assets: report.succeeded_count(),
                bytes: report.bytes_transferred(),
            })
        } else {
            Ok(RepoOutcome::PartiallyFailed {
                tag,
                failed: report.failed_count(),
                total: report.outcomes.len(),
            })
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }
}

/// Download tasks for one release under the target's asset selection.
/// Artifacts land at `<download_dir>/<owner>/<repo>/<tag>/<file_name>`.
pub fn build_tasks(
    target: &BackupTarget,
    release: &Release,
    download_dir: &Path,
) -> Vec<DownloadTask> {
    let release_dir = download_dir
        .join(&target.repo.owner)
        .join(&target.repo.name)
        .join(sanitize_path_component(&release.tag_name));

    let mut tasks = Vec::new();

    if matches!(target.assets, AssetSelection::Assets | AssetSelection::All) {
        for asset in &release.assets {
            let expected_digest = asset.digest.as_deref().and_then(|raw| {
                match AssetDigest::parse(raw) {
                    Ok(digest) => Some(digest),
                    Err(err) => {
                        warn!(asset = %asset.name, error = %err, "Ignoring unusable asset digest");
                        None
                    }
                }
            });
            let file_name = sanitize_path_component(&asset.name);
            tasks.push(DownloadTask {
                url: asset.browser_download_url.clone(),
                dest_path: release_dir.join(&file_name),
                file_name,
                expected_size: (asset.size > 0).then_some(asset.size),
                expected_digest,
            });
        }
    }

    if matches!(target.assets, AssetSelection::Source | AssetSelection::All)
        && let Some(tarball_url) = &release.tarball_url
    {
        let file_name = sanitize_path_component(&format!(
            "{}-{}.tar.gz",
            target.repo.name, release.tag_name
        ));
        tasks.push(DownloadTask {
            url: tarball_url.clone(),
            dest_path: release_dir.join(&file_name),
            file_name,
            expected_size: None,
            expected_digest: None,
        });
    }

    tasks
}

fn sanitize_path_component(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
