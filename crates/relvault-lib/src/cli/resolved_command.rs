use crate::backup::BackupTarget;
use crate::cli::args::Command;
use crate::cli::params::{CheckParams, RunParams, StatusParams};
use crate::config::{load_config, Config, STATE_FILE_NAME};
use crate::error::RelvaultError;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Run(RunParams),
    Check(CheckParams),
    Status(StatusParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, RelvaultError> {
    match command {
        Command::Run {
            config_path,
            download_dir,
            max_attempts,
        } => {
            let app_config = load_config(&config_path)?;
            validate_config(&app_config)?;

            if max_attempts == Some(0) {
                return Err(RelvaultError::CliArgumentValidation {
                    details: "max-attempts must be greater than 0.".to_string(),
                });
            }

            let targets = resolve_targets(&app_config)?;

            let download_dir = download_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| app_config.download.path.clone());
            // An explicit state_path wins; otherwise the state file follows
            // the (possibly overridden) download directory.
            let state_path = app_config
                .state_path
                .clone()
                .unwrap_or_else(|| download_dir.join(STATE_FILE_NAME));

            let mut policy = app_config.retry.policy();
            if let Some(max_attempts) = max_attempts {
                policy.max_attempts = max_attempts;
            }

            Ok(ResolvedCommand::Run(RunParams {
                app_config,
                targets,
                download_dir,
                state_path,
                policy,
            }))
        }
        Command::Check { config_path } => {
            let app_config = load_config(&config_path)?;
            validate_config(&app_config)?;
            let targets = resolve_targets(&app_config)?;
            let state_path = app_config.state_path();

            Ok(ResolvedCommand::Check(CheckParams {
                app_config,
                targets,
                state_path,
            }))
        }
        Command::Status { config_path } => {
            let app_config = load_config(&config_path)?;
            Ok(ResolvedCommand::Status(StatusParams {
                state_path: app_config.state_path(),
            }))
        }
    }
}

fn validate_config(app_config: &Config) -> Result<(), RelvaultError> {
    if app_config.repositories.is_empty() {
        return Err(RelvaultError::CliArgumentValidation {
            details: "No repositories defined in config.".to_string(),
        });
    }

    for (name, value) in [
        ("retry.max_attempts", app_config.retry.max_attempts),
        ("download.parallelism", app_config.download.parallelism),
    ] {
        if value == 0 {
            return Err(RelvaultError::CliArgumentValidation {
                details: format!("{name} must be greater than 0."),
            });
        }
    }

    if app_config.download.timeout_secs == 0 {
        return Err(RelvaultError::CliArgumentValidation {
            details: "download.timeout_secs must be greater than 0.".to_string(),
        });
    }

    for (name, value) in [
        ("api_base_url", &app_config.api_base_url),
        ("proxy", &app_config.proxy),
    ] {
        if let Some(value) = value
            && url::Url::parse(value).is_err()
        {
            return Err(RelvaultError::CliArgumentValidation {
                details: format!("{name} is not a valid URL: {value}"),
            });
        }
    }

    Ok(())
}

fn resolve_targets(app_config: &Config) -> Result<Vec<BackupTarget>, RelvaultError> {
    app_config
        .repositories
        .iter()
        .map(|def| {
            Ok(BackupTarget {
                repo: def.target()?,
                assets: def.asset_selection(app_config.download.assets),
            })
        })
        .collect()
}
