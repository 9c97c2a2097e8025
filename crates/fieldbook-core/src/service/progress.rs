// Upload progress publishing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fieldbook_api::ProgressFn;
use tokio::sync::watch;
use tracing::trace;

/// Publishes one upload's byte progress as a 0–100 percentage.
///
/// Dropping it resets the channel to 0 and mutes the callback, so late
/// chunks from an abandoned transfer cannot move the bar again.
pub(crate) struct UploadProgress {
    tx: Arc<watch::Sender<u8>>,
    closed: Arc<AtomicBool>,
}

impl UploadProgress {
    pub(crate) fn start(tx: Arc<watch::Sender<u8>>) -> Self {
        tx.send_replace(0);
        Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn callback(&self) -> ProgressFn {
        let tx = Arc::clone(&self.tx);
        let closed = Arc::clone(&self.closed);
        Arc::new(move |sent, total| {
            if closed.load(Ordering::Acquire) {
                return;
            }
            let pct = percent(sent, total);
            // Never step backwards within a call.
            let moved = tx.send_if_modified(|current| {
                if pct > *current {
                    *current = pct;
                    true
                } else {
                    false
                }
            });
            if moved {
                trace!(sent, total, pct, "upload progress");
            }
        })
    }
}

impl Drop for UploadProgress {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.tx.send_replace(0);
    }
}

/// `round(sent / total * 100)`, clamped to 100. An empty body is done.
pub(crate) fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (sent.saturating_mul(100) + total / 2) / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}
