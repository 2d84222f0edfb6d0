use crate::backup::BackupOrchestrator;
use crate::cli::params::RunParams;
use crate::download::{DownloadEngine, TracingProgress};
use crate::error::RelvaultError;
use crate::release::{build_client, ReleaseFetcher};
use crate::state::StateStore;
use std::sync::Arc;
use tracing;

pub async fn run_backup(params: RunParams) -> Result<(), RelvaultError> {
    tracing::info!(
        repositories = params.targets.len(),
        download_dir = %params.download_dir.display(),
        "Starting backup run"
    );

    let client = build_client(&params.app_config)?;
    let fetcher = ReleaseFetcher::new(client.clone(), params.app_config.api_base_url());
    let engine = DownloadEngine::new(
        client,
        params.policy,
        params.app_config.download.parallelism,
    );
    let state = StateStore::load(&params.state_path)?;

    let mut orchestrator =
        BackupOrchestrator::new(fetcher, engine, state, params.download_dir.clone());
    let summary = orchestrator
        .run(&params.targets, Arc::new(TracingProgress))
        .await?;

    if summary.is_clean() {
        tracing::info!(
            repositories = summary.repositories.len(),
            "Backup run completed"
        );
        Ok(())
    } else {
        Err(RelvaultError::IncompleteBackup {
            failed_repositories: summary.failed_count(),
            total_repositories: summary.repositories.len(),
        })
    }
}
