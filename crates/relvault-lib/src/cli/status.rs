use crate::cli::params::StatusParams;
use crate::error::RelvaultError;
use crate::state::StateStore;

/// Print the last backed-up release per repository. Local only.
pub fn run_status(params: StatusParams) -> Result<(), RelvaultError> {
    let state = StateStore::load(&params.state_path)?;

    let mut printed = false;
    for (repo, entry) in state.entries() {
        println!(
            "{}: {} (recorded {})",
            repo,
            entry.last_release,
            entry.checked_at.to_rfc3339()
        );
        printed = true;
    }

    if !printed {
        println!("No backups recorded yet");
    }

    Ok(())
}
