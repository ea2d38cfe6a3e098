//! Progress tracking

use tokio::sync::Mutex;
use tracing::info;

pub struct ProgressTracker {
    total: Mutex<usize>,
    matched: Mutex<usize>,
    empty: Mutex<usize>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            total: Mutex::new(0),
            matched: Mutex::new(0),
            empty: Mutex::new(0),
        }
    }

    pub async fn set_total(&self, total: usize) {
        *self.total.lock().await = total;
    }

    /// A probe produced at least one login attempt.
    pub async fn increment_matched(&self) {
        *self.matched.lock().await += 1;
    }

    /// A probe failed to connect, matched nothing, or aborted dispatch.
    pub async fn increment_empty(&self) {
        *self.empty.lock().await += 1;
    }

    pub async fn snapshot(&self) -> (usize, usize, usize) {
        (
            *self.total.lock().await,
            *self.matched.lock().await,
            *self.empty.lock().await,
        )
    }

    pub async fn print_summary(&self) {
        let (total, matched, empty) = self.snapshot().await;

        info!("Fingerprint Summary:");
        info!("  Total probes: {}", total);
        info!("  Matched: {}", matched);
        info!("  No attempts: {}", empty);
        if total > 0 {
            info!("  Match rate: {:.1}%", (matched as f64 / total as f64) * 100.0);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
