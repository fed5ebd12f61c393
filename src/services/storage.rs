use crate::models::StoredObject;
use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Signs a single-object PUT. Binding `content_type` makes the backend
    /// reject uploads that declare a different type.
    async fn presign_put(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in_secs: u64,
    ) -> Result<String>;
    async fn list_objects(&self, prefix: &str) -> Result<Vec<StoredObject>>;
    async fn bucket_reachable(&self) -> Result<()>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn presign_put(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in_secs: u64,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))?;

        let mut request = self.client.put_object().bucket(&self.bucket).key(key);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let presigned = request.presigned(presigning).await.map_err(|e| {
            tracing::error!(
                "S3 presign failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            anyhow::anyhow!(e)
        })?;

        Ok(presigned.uri().to_string())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await?;

            if let Some(contents) = res.contents {
                for object in contents {
                    let Some(key) = object.key else { continue };

                    let uploaded = object
                        .last_modified
                        .map(|d| {
                            chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                                .unwrap_or_default()
                                .to_rfc3339()
                        })
                        .unwrap_or_default();

                    objects.push(StoredObject {
                        key,
                        size: object.size.unwrap_or(0),
                        uploaded,
                        http_etag: object.e_tag,
                    });
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn bucket_reachable(&self) -> Result<()> {
        self.client.head_bucket().bucket(&self.bucket).send().await?;
        Ok(())
    }
}
