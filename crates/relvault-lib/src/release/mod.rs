mod fetcher;
mod model;

pub use fetcher::{build_client, FetchError, ReleaseFetcher};
pub use model::{Release, ReleaseAsset, RepositoryInfo};
