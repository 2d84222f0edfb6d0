mod engine;
mod progress;
mod types;

pub use engine::DownloadEngine;
pub use progress::{ProgressObserver, TracingProgress};
pub use types::{DownloadError, DownloadReport, DownloadTask, TaskOutcome, TaskStatus};
