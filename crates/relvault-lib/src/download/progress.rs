/// Observer of transfer progress, invoked with (bytes so far, total when
/// known). Kept separate from the transfer loop so it can be exercised
/// without real I/O.
pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, file_name: &str, total: Option<u64>);
    fn on_progress(&self, file_name: &str, bytes_so_far: u64, total: Option<u64>);
    fn on_finish(&self, file_name: &str, bytes: u64);
}

/// Default observer: emits progress through the log sink.
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_start(&self, file_name: &str, total: Option<u64>) {
        match total {
            Some(total) => tracing::info!(file = file_name, total_bytes = total, "Downloading"),
            None => tracing::info!(file = file_name, "Downloading (size unknown)"),
        }
    }

    fn on_progress(&self, file_name: &str, bytes_so_far: u64, total: Option<u64>) {
        match total {
            Some(total) => tracing::trace!(
                file = file_name,
                bytes = bytes_so_far,
                total_bytes = total,
                "Transfer progress"
            ),
            None => tracing::trace!(file = file_name, bytes = bytes_so_far, "Transfer progress"),
        }
    }

    fn on_finish(&self, file_name: &str, bytes: u64) {
        tracing::info!(file = file_name, bytes = bytes, "Download finished");
    }
}
