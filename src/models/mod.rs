use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Short-lived URL allowing a single PUT of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WriteCredential {
    pub url: String,
}

/// An object previously uploaded under the namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: String,
    pub size: i64,
    /// RFC 3339 upload time as reported by the backend
    #[serde(default)]
    pub uploaded: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_etag: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListResponse {
    pub objects: Vec<StoredObject>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PresignQuery {
    /// Name of the object to create under the upload prefix
    pub filename: Option<String>,
    /// Declared MIME type; may be empty
    pub content_type: Option<String>,
}

/// Browser-facing link for a stored object on the public host.
pub fn public_link(host: &str, key: &str) -> String {
    format!(
        "https://{}/{}",
        host.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
