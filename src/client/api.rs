use crate::client::error::UploadError;
use crate::models::{ListResponse, StoredObject, WriteCredential};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Hands out one write URL per upload attempt.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn request_credential(
        &self,
        name: &str,
        content_type: &str,
    ) -> Result<WriteCredential, UploadError>;
}

/// Enumerates stored objects. Never fails: a broken listing is an empty one.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_objects(&self) -> Vec<StoredObject>;
}

/// Client for the edge API's `/api/r2/*` endpoints.
#[derive(Clone)]
pub struct HttpUploadApi {
    client: reqwest::Client,
    base: Url,
}

#[derive(Deserialize)]
struct PresignBody {
    url: Option<String>,
}

impl HttpUploadApi {
    pub fn new(base: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(client: reqwest::Client, base: &str) -> Result<Self> {
        let mut base = Url::parse(base).with_context(|| format!("invalid API base URL: {}", base))?;
        // Url::join replaces the last segment unless the path ends in '/'
        let path = format!("{}/", base.path().trim_end_matches('/'));
        base.set_path(&path);
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    async fn fetch_listing(&self) -> Result<Vec<StoredObject>> {
        let response = self
            .client
            .get(self.endpoint("api/r2/list")?)
            .send()
            .await?
            .error_for_status()?;

        let body: ListResponse = response
            .json()
            .await
            .context("listing body is not of the expected shape")?;
        Ok(body.objects)
    }
}

#[async_trait]
impl CredentialIssuer for HttpUploadApi {
    async fn request_credential(
        &self,
        name: &str,
        content_type: &str,
    ) -> Result<WriteCredential, UploadError> {
        let mut url = self
            .endpoint("api/r2/presign")
            .map_err(|e| UploadError::Credential(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("filename", name)
            .append_pair("contentType", content_type);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UploadError::Credential(format!("issuer unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(UploadError::Credential(format!(
                "issuer responded with {}: {}",
                status,
                detail.trim()
            )));
        }

        let body: PresignBody = response
            .json()
            .await
            .map_err(|e| UploadError::Credential(format!("malformed issuer response: {}", e)))?;

        let url = body
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| UploadError::Credential("issuer response has no url".to_string()))?;

        Url::parse(&url)
            .map_err(|e| UploadError::Credential(format!("issuer url is not absolute: {}", e)))?;

        Ok(WriteCredential { url })
    }
}

#[async_trait]
impl ObjectLister for HttpUploadApi {
    async fn list_objects(&self) -> Vec<StoredObject> {
        match self.fetch_listing().await {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!("Object listing unavailable, showing none: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = HttpUploadApi::new("https://roster.example.com/edge").unwrap();
        assert_eq!(
            api.endpoint("api/r2/list").unwrap().as_str(),
            "https://roster.example.com/edge/api/r2/list"
        );

        let api = HttpUploadApi::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(
            api.endpoint("api/r2/presign").unwrap().as_str(),
            "http://127.0.0.1:3000/api/r2/presign"
        );
    }

    #[test]
    fn test_rejects_relative_base() {
        assert!(HttpUploadApi::new("/api").is_err());
    }
}
