use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use roster_uploads::config::StorageConfig;
use roster_uploads::models::StoredObject;
use roster_uploads::services::storage::StorageService;
use roster_uploads::{AppState, create_app};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
struct MockStorageService {
    objects: Vec<StoredObject>,
    fail: bool,
    presigned: Mutex<Vec<(String, Option<String>, u64)>>,
    listed_prefixes: Mutex<Vec<String>>,
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn presign_put(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in_secs: u64,
    ) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("signing key unavailable");
        }
        self.presigned.lock().unwrap().push((
            key.to_string(),
            content_type.map(str::to_string),
            expires_in_secs,
        ));
        Ok(format!(
            "https://store.example/roster/{}?X-Amz-Expires={}",
            key, expires_in_secs
        ))
    }

    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<StoredObject>> {
        if self.fail {
            anyhow::bail!("bucket unreachable");
        }
        self.listed_prefixes.lock().unwrap().push(prefix.to_string());
        Ok(self.objects.clone())
    }

    async fn bucket_reachable(&self) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("bucket unreachable");
        }
        Ok(())
    }
}

fn test_config() -> StorageConfig {
    StorageConfig {
        endpoint: "http://127.0.0.1:9000".to_string(),
        access_key: "key".to_string(),
        secret_key: "secret".to_string(),
        bucket: "roster".to_string(),
        region: "auto".to_string(),
        upload_prefix: "uploads/".to_string(),
        presign_expires_secs: 900,
    }
}

fn app_with(storage: Arc<MockStorageService>) -> axum::Router {
    create_app(AppState {
        storage,
        config: test_config(),
    })
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_presign_returns_url_for_prefixed_key() {
    let storage = Arc::new(MockStorageService::default());
    let (status, json) = get(
        app_with(storage.clone()),
        "/api/r2/presign?filename=report.pdf&contentType=application%2Fpdf",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["url"],
        "https://store.example/roster/uploads/report.pdf?X-Amz-Expires=900"
    );

    let presigned = storage.presigned.lock().unwrap();
    assert_eq!(
        presigned.as_slice(),
        &[(
            "uploads/report.pdf".to_string(),
            Some("application/pdf".to_string()),
            900
        )]
    );
}

#[tokio::test]
async fn test_presign_with_empty_content_type_signs_without_it() {
    let storage = Arc::new(MockStorageService::default());
    let (status, _) = get(
        app_with(storage.clone()),
        "/api/r2/presign?filename=notes&contentType=",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let presigned = storage.presigned.lock().unwrap();
    assert_eq!(presigned[0].0, "uploads/notes");
    assert_eq!(presigned[0].1, None);
}

#[tokio::test]
async fn test_presign_requires_filename() {
    let storage = Arc::new(MockStorageService::default());

    let (status, json) = get(app_with(storage.clone()), "/api/r2/presign").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "filename is required");

    let (status, _) = get(app_with(storage.clone()), "/api/r2/presign?filename=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(storage.presigned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_presign_failure_hides_details() {
    let storage = Arc::new(MockStorageService {
        fail: true,
        ..Default::default()
    });
    let (status, json) = get(app_with(storage), "/api/r2/presign?filename=a.txt").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal Server Error");
    assert!(json.get("url").is_none());
}

#[tokio::test]
async fn test_list_returns_objects_under_prefix() {
    let storage = Arc::new(MockStorageService {
        objects: vec![StoredObject {
            key: "uploads/report.pdf".to_string(),
            size: 2048,
            uploaded: "2026-10-16T09:00:00+00:00".to_string(),
            http_etag: Some("\"5d41402abc4b2a76\"".to_string()),
        }],
        ..Default::default()
    });
    let (status, json) = get(app_with(storage.clone()), "/api/r2/list").await;

    assert_eq!(status, StatusCode::OK);
    let objects = json["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["key"], "uploads/report.pdf");
    assert_eq!(objects[0]["size"], 2048);
    assert_eq!(objects[0]["uploaded"], "2026-10-16T09:00:00+00:00");
    assert_eq!(objects[0]["httpEtag"], "\"5d41402abc4b2a76\"");

    assert_eq!(
        storage.listed_prefixes.lock().unwrap().as_slice(),
        &["uploads/".to_string()]
    );
}

#[tokio::test]
async fn test_list_failure_is_server_error() {
    let storage = Arc::new(MockStorageService {
        fail: true,
        ..Default::default()
    });
    let (status, json) = get(app_with(storage), "/api/r2/list").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json.get("objects").is_none());
}

#[tokio::test]
async fn test_health_reports_storage_status() {
    let (status, json) = get(app_with(Arc::new(MockStorageService::default())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "connected");

    let failing = Arc::new(MockStorageService {
        fail: true,
        ..Default::default()
    });
    let (_, json) = get(app_with(failing), "/health").await;
    assert_eq!(json["storage"], "disconnected");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_assigned() {
    let app = app_with(Arc::new(MockStorageService::default()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let assigned = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(assigned.len(), 36);
}
