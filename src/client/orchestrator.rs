//! Drives one upload attempt through its phases.
//!
//! State lives in an explicit [`UploadState`] record that each operation takes
//! by value and hands back, so a view layer only has to render whatever it
//! receives.

use crate::client::api::{CredentialIssuer, ObjectLister};
use crate::client::candidate::UploadCandidate;
use crate::client::error::UploadError;
use crate::client::observer::{NoopObserver, UploadObserver};
use crate::client::transport::UploadTransport;
use crate::config::MAX_FILE_SIZE;
use crate::models::{StoredObject, WriteCredential};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Validating,
    RequestingCredential,
    Transporting,
    Refreshing,
}

#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub phase: UploadPhase,
    pub selected: Option<UploadCandidate>,
    /// Last reported percentage of the running transfer, 0 when idle
    pub progress: u8,
    pub objects: Vec<StoredObject>,
    /// User-visible outcome of the last failed attempt
    pub message: Option<String>,
}

impl UploadState {
    pub fn select(mut self, candidate: UploadCandidate) -> Self {
        self.selected = Some(candidate);
        self.progress = 0;
        self.message = None;
        self
    }

    pub fn clear_selection(mut self) -> Self {
        self.selected = None;
        self.progress = 0;
        self
    }

    /// True while an attempt is running; the upload trigger should be disabled.
    pub fn is_busy(&self) -> bool {
        self.phase != UploadPhase::Idle
    }
}

/// Local size policy, checked before any network call.
pub fn validate_size(candidate: &UploadCandidate, max: u64) -> Result<(), UploadError> {
    if candidate.byte_size > max {
        return Err(UploadError::Validation {
            size: candidate.byte_size,
            max,
        });
    }
    Ok(())
}

pub struct UploadOrchestrator {
    issuer: Arc<dyn CredentialIssuer>,
    transport: Arc<dyn UploadTransport>,
    lister: Arc<dyn ObjectLister>,
    observer: Arc<dyn UploadObserver>,
    max_file_size: u64,
}

impl UploadOrchestrator {
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        transport: Arc<dyn UploadTransport>,
        lister: Arc<dyn ObjectLister>,
    ) -> Self {
        Self {
            issuer,
            transport,
            lister,
            observer: Arc::new(NoopObserver),
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Replaces the object collection with a fresh listing.
    pub async fn refresh(&self, mut state: UploadState) -> UploadState {
        state.objects = self.lister.list_objects().await;
        self.observer.objects_refreshed(&state.objects);
        state
    }

    /// Runs a complete attempt for the selected candidate. The returned state
    /// is always `Idle`; a failure leaves its message in `state.message`.
    pub async fn upload(&self, mut state: UploadState) -> UploadState {
        if state.is_busy() {
            tracing::warn!("Upload requested while {:?}; ignoring", state.phase);
            return state;
        }

        let Some(candidate) = state.selected.clone() else {
            state.message = Some("No file selected".to_string());
            return state;
        };
        state.message = None;

        match self.attempt(&mut state, candidate).await {
            Ok(()) => tracing::info!("✅ Upload finished"),
            Err(e) => {
                self.observer.failed(&e);
                state.progress = 0;
                state.message = Some(e.to_string());
            }
        }

        self.enter(&mut state, UploadPhase::Idle);
        state
    }

    async fn attempt(
        &self,
        state: &mut UploadState,
        candidate: UploadCandidate,
    ) -> Result<(), UploadError> {
        self.enter(state, UploadPhase::Validating);
        validate_size(&candidate, self.max_file_size)?;

        self.enter(state, UploadPhase::RequestingCredential);
        let credential = self
            .issuer
            .request_credential(&candidate.name, &candidate.mime_type)
            .await?;

        self.enter(state, UploadPhase::Transporting);
        self.transfer(state, &credential, &candidate).await?;

        self.enter(state, UploadPhase::Refreshing);
        state.progress = 0;
        state.selected = None;
        state.objects = self.lister.list_objects().await;
        self.observer.objects_refreshed(&state.objects);

        Ok(())
    }

    async fn transfer(
        &self,
        state: &mut UploadState,
        credential: &WriteCredential,
        candidate: &UploadCandidate,
    ) -> Result<(), UploadError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transfer = self.transport.put(&credential.url, candidate, tx);
        tokio::pin!(transfer);

        let outcome = loop {
            tokio::select! {
                biased;
                Some(percent) = rx.recv() => self.relay_progress(state, percent),
                outcome = &mut transfer => break outcome,
            }
        };

        // Values queued after the final poll still count.
        while let Ok(percent) = rx.try_recv() {
            self.relay_progress(state, percent);
        }

        outcome
    }

    fn relay_progress(&self, state: &mut UploadState, percent: u8) {
        let percent = percent.min(100);
        state.progress = percent;
        self.observer.progress(percent);
    }

    fn enter(&self, state: &mut UploadState, phase: UploadPhase) {
        state.phase = phase;
        self.observer.phase_changed(phase);
    }
}
