//! Browser-side half of the upload flow: credential request, direct PUT to
//! storage with progress, and listing refresh.

pub mod api;
pub mod candidate;
pub mod error;
pub mod observer;
pub mod orchestrator;
pub mod transport;

pub use api::{CredentialIssuer, HttpUploadApi, ObjectLister};
pub use candidate::{CandidateBody, UploadCandidate};
pub use error::UploadError;
pub use observer::{LoggingObserver, NoopObserver, UploadObserver};
pub use orchestrator::{UploadOrchestrator, UploadPhase, UploadState};
pub use transport::{HttpTransport, UploadTransport};
