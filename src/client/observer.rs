use crate::client::error::UploadError;
use crate::client::orchestrator::UploadPhase;
use crate::models::StoredObject;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{info, warn};

/// View-side hooks fired by the orchestrator as an attempt progresses.
pub trait UploadObserver: Send + Sync {
    fn phase_changed(&self, _phase: UploadPhase) {}

    /// Latest transport progress, relayed verbatim.
    fn progress(&self, _percent: u8) {}

    fn failed(&self, _error: &UploadError) {}

    fn objects_refreshed(&self, _objects: &[StoredObject]) {}
}

pub struct NoopObserver;

impl UploadObserver for NoopObserver {}

/// Reports an attempt through `tracing`, logging each distinct percentage once.
pub struct LoggingObserver {
    last_logged: AtomicU8,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            last_logged: AtomicU8::new(u8::MAX),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadObserver for LoggingObserver {
    fn phase_changed(&self, phase: UploadPhase) {
        if phase == UploadPhase::Transporting {
            self.last_logged.store(u8::MAX, Ordering::Relaxed);
        }
        info!("➡️  {:?}", phase);
    }

    fn progress(&self, percent: u8) {
        if self.last_logged.swap(percent, Ordering::Relaxed) != percent {
            info!("📤 {}%", percent);
        }
    }

    fn failed(&self, error: &UploadError) {
        warn!("❌ {}", error);
    }

    fn objects_refreshed(&self, objects: &[StoredObject]) {
        info!("📚 {} object(s) stored", objects.len());
    }
}
