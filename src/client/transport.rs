use crate::client::candidate::{CandidateBody, UploadCandidate};
use crate::client::error::UploadError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

/// Granularity of progress reporting for the request body.
pub const PROGRESS_SLICE: usize = 64 * 1024;

/// Integer percentages, last value wins. The sender is owned by one transfer.
pub type ProgressSender = mpsc::UnboundedSender<u8>;

/// Performs a single PUT of a candidate to a write URL.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn put(
        &self,
        url: &str,
        candidate: &UploadCandidate,
        progress: ProgressSender,
    ) -> Result<(), UploadError>;
}

/// `round(sent / total * 100)`, or `None` when the ratio is undefined.
pub fn percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let ratio = sent.min(total) as f64 / total as f64;
    Some((ratio * 100.0).round() as u8)
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn put(
        &self,
        url: &str,
        candidate: &UploadCandidate,
        progress: ProgressSender,
    ) -> Result<(), UploadError> {
        let (total, chunks) = body_chunks(&candidate.body)
            .await
            .map_err(|e| UploadError::Transport(format!("cannot read {}: {}", candidate.name, e)))?;

        // The size policy was checked against byte_size; a body that no longer
        // matches it must not be sent under that length.
        if total != candidate.byte_size {
            return Err(UploadError::Transport(format!(
                "{} changed since selection: expected {} bytes, found {}",
                candidate.name, candidate.byte_size, total
            )));
        }

        let mut sent = 0u64;
        let counted = chunks.map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                if let Some(pct) = percent(sent, total) {
                    // Receiver gone means nobody is watching; keep sending bytes.
                    let _ = progress.send(pct);
                }
            }
            chunk
        });

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, candidate.content_type())
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(counted))
            .send()
            .await
            .map_err(|e| UploadError::Transport(format!("network failure: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("PUT {} accepted with {}", candidate.name, status);
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(UploadError::Transport(format!(
                "storage responded with {}: {}",
                status,
                detail.trim()
            )))
        }
    }
}

/// The body's actual length alongside the stream that will send it.
async fn body_chunks(
    body: &CandidateBody,
) -> std::io::Result<(u64, BoxStream<'static, std::io::Result<Bytes>>)> {
    match body {
        CandidateBody::Memory(bytes) => {
            let slices: Vec<std::io::Result<Bytes>> = (0..bytes.len())
                .step_by(PROGRESS_SLICE)
                .map(|start| Ok(bytes.slice(start..(start + PROGRESS_SLICE).min(bytes.len()))))
                .collect();
            Ok((bytes.len() as u64, stream::iter(slices).boxed()))
        }
        CandidateBody::File(path) => {
            let file = tokio::fs::File::open(path).await?;
            let len = file.metadata().await?.len();
            Ok((len, ReaderStream::with_capacity(file, PROGRESS_SLICE).boxed()))
        }
    }
}
