use thiserror::Error;

/// Reasons an upload attempt is aborted. Listing failures are not here:
/// they degrade to an empty collection instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("File is too large: {size} bytes exceeds the {max} byte limit")]
    Validation { size: u64, max: u64 },

    #[error("Could not obtain upload URL: {0}")]
    Credential(String),

    #[error("Upload failed: {0}")]
    Transport(String),
}
