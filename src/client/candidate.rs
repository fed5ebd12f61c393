use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Sent when the candidate's MIME type is unknown.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Where the candidate's content comes from.
#[derive(Debug, Clone)]
pub enum CandidateBody {
    Memory(Bytes),
    /// Read lazily by the transport, so oversized files never hit memory.
    File(PathBuf),
}

/// A file the user picked for upload.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub name: String,
    pub byte_size: u64,
    /// Declared MIME type; empty when unknown
    pub mime_type: String,
    pub body: CandidateBody,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            byte_size: bytes.len() as u64,
            mime_type: mime_type.into(),
            body: CandidateBody::Memory(bytes),
        }
    }

    /// Describes a local file. The MIME type is guessed from the extension,
    /// then from the leading bytes.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("cannot stat {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("{} is not a regular file", path.display());
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("{} has no usable file name", path.display()))?;

        let mime_type = match mime_guess::from_path(path).first_raw() {
            Some(guess) => guess.to_string(),
            None => sniff_mime(path).await.unwrap_or_default(),
        };

        Ok(Self {
            name,
            byte_size: metadata.len(),
            mime_type,
            body: CandidateBody::File(path.to_path_buf()),
        })
    }

    /// Value for the `Content-Type` header of the PUT.
    pub fn content_type(&self) -> &str {
        if self.mime_type.trim().is_empty() {
            FALLBACK_CONTENT_TYPE
        } else {
            &self.mime_type
        }
    }
}

async fn sniff_mime(path: &Path) -> Option<String> {
    let file = tokio::fs::File::open(path).await.ok()?;
    let mut header = Vec::with_capacity(8192);
    file.take(8192).read_to_end(&mut header).await.ok()?;
    infer::get(&header).map(|kind| kind.mime_type().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_content_type_falls_back_to_octet_stream() {
        let candidate = UploadCandidate::new("blob", "", vec![1u8, 2, 3]);
        assert_eq!(candidate.content_type(), "application/octet-stream");
        assert_eq!(candidate.byte_size, 3);

        let candidate = UploadCandidate::new("report.pdf", "application/pdf", vec![0u8; 4]);
        assert_eq!(candidate.content_type(), "application/pdf");
    }

    #[tokio::test]
    async fn test_from_path_guesses_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, b"name,team\nada,core\n").unwrap();

        let candidate = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.name, "roster.csv");
        assert_eq!(candidate.byte_size, 19);
        assert_eq!(candidate.mime_type, "text/csv");
        assert!(matches!(candidate.body, CandidateBody::File(_)));
    }

    #[tokio::test]
    async fn test_from_path_sniffs_content_without_extension() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();

        let candidate = UploadCandidate::from_path(file.path()).await.unwrap();
        assert_eq!(candidate.mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_from_path_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UploadCandidate::from_path(dir.path()).await.is_err());
    }
}
