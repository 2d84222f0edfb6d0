use crate::backup::build_tasks;
use crate::cli::params::CheckParams;
use crate::error::RelvaultError;
use crate::release::{build_client, FetchError, ReleaseFetcher};
use crate::state::StateStore;
use tracing;

/// Report what a `run` would download, without touching disk or state.
pub async fn run_check(params: CheckParams) -> Result<(), RelvaultError> {
    let client = build_client(&params.app_config)?;
    let fetcher = ReleaseFetcher::new(client, params.app_config.api_base_url());
    let state = StateStore::load(&params.state_path)?;

    for target in &params.targets {
        match fetcher.fetch_latest(&target.repo).await {
            Ok(release) => {
                if state.get_last(&target.repo) == Some(release.tag_name.as_str()) {
                    println!("{}: up to date at {}", target.repo, release.tag_name);
                    continue;
                }
                let tasks = build_tasks(target, &release, &params.app_config.download.path);
                println!(
                    "{}: new release {} ({} artifacts pending)",
                    target.repo,
                    release.tag_name,
                    tasks.len()
                );
                for task in &tasks {
                    println!("  {}", task.file_name);
                }
            }
            Err(FetchError::NotFound) => match fetcher.fetch_default_branch(&target.repo).await {
                Ok(branch) => {
                    println!("{}: no releases (default branch: {})", target.repo, branch)
                }
                Err(err) => {
                    tracing::debug!(repo = %target.repo, error = %err, "Default branch lookup failed");
                    println!("{}: no releases", target.repo);
                }
            },
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
                println!("{}: check failed: {}", target.repo, reason);
            }
        }
    }

    Ok(())
}
