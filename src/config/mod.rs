use anyhow::{Result, anyhow};
use std::env;

/// Largest file the client will try to upload: 1 GiB
pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Namespace every managed object lives under
pub const DEFAULT_UPLOAD_PREFIX: &str = "uploads/";

/// Object storage settings for the edge API
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3-compatible endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,

    pub access_key: String,

    pub secret_key: String,

    pub bucket: String,

    /// Signing region (default: "auto", which is what R2 expects)
    pub region: String,

    /// Key prefix for uploaded objects (default: "uploads/")
    pub upload_prefix: String,

    /// Lifetime of a presigned PUT URL in seconds (default: 3600)
    pub presign_expires_secs: u64,
}

impl StorageConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: required("R2_ENDPOINT")?,
            access_key: required("R2_ACCESS_KEY")?,
            secret_key: required("R2_SECRET_KEY")?,
            bucket: required("R2_BUCKET")?,
            region: env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            upload_prefix: env::var("UPLOAD_PREFIX")
                .map(|p| normalize_prefix(&p))
                .unwrap_or_else(|_| DEFAULT_UPLOAD_PREFIX.to_string()),
            presign_expires_secs: env::var("PRESIGN_EXPIRES_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        })
    }

    /// Full object key for a client-supplied file name
    pub fn object_key(&self, filename: &str) -> String {
        format!("{}{}", self.upload_prefix, filename)
    }
}

/// Settings for the upload client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the edge API (default: "http://127.0.0.1:3000")
    pub api_base: String,

    /// Maximum candidate size in bytes (default: 1 GiB)
    pub max_file_size: u64,

    /// Host used to build public links for stored objects
    pub public_host: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:3000".to_string(),
            max_file_size: MAX_FILE_SIZE,
            public_host: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api_base: env::var("UPLOAD_API_BASE").unwrap_or(default.api_base),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            public_host: env::var("PUBLIC_HOST").ok().filter(|h| !h.is_empty()),
        }
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} must be set", name))
}

/// Ensures a non-empty prefix ends with exactly one `/`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}
