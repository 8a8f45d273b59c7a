//! Periodic removal of uploads that were never confirmed.
//!
//! The delayed verification job normally decides every upload. When scheduling
//! it failed at intake, nothing else would, so this loop deletes unconfirmed
//! rows past [`UploadTiming::unconfirmed_expiry_secs`] and sends the owner the
//! same "missing upload" notice.
//!
//! [`UploadTiming::unconfirmed_expiry_secs`]: syllabi_core::upload::UploadTiming::unconfirmed_expiry_secs

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::upload::UploadOrchestrator;

/// Run the sweep every `every` until `cancel` is triggered.
pub async fn run(uploads: Arc<UploadOrchestrator>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Unconfirmed upload sweep started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Unconfirmed upload sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match uploads.sweep_unconfirmed().await {
                    Ok(0) => tracing::debug!("Unconfirmed upload sweep: nothing to remove"),
                    Ok(removed) => {
                        tracing::info!(removed, "Unconfirmed upload sweep: removed stale uploads");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Unconfirmed upload sweep failed");
                    }
                }
            }
        }
    }
}
