use crate::backup::BackupTarget;
use crate::config::Config;
use crate::retry::RetryPolicy;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunParams {
    pub app_config: Config,
    pub targets: Vec<BackupTarget>,
    pub download_dir: PathBuf,
    pub state_path: PathBuf,
    pub policy: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct CheckParams {
    pub app_config: Config,
    pub targets: Vec<BackupTarget>,
    pub state_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StatusParams {
    pub state_path: PathBuf,
}
