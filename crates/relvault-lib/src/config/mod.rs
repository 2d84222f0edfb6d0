mod loader;
mod model;

pub use loader::load_config;
pub use model::{
    AssetSelection, Config, DownloadConfig, RepoTarget, RepositoryDef, RetryConfig,
    DEFAULT_API_BASE_URL, STATE_FILE_NAME,
};
