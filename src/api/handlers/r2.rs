use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ListResponse, PresignQuery, WriteCredential};
use axum::{
    Json,
    extract::{Query, State},
};

#[utoipa::path(
    get,
    path = "/api/r2/presign",
    params(PresignQuery),
    responses(
        (status = 200, description = "Presigned PUT URL for one object", body = WriteCredential),
        (status = 400, description = "Missing filename"),
        (status = 500, description = "Signing failed")
    ),
    tag = "uploads"
)]
pub async fn presign(
    State(state): State<AppState>,
    Query(query): Query<PresignQuery>,
) -> Result<Json<WriteCredential>, AppError> {
    let filename = query
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::BadRequest("filename is required".to_string()))?;

    let content_type = query
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let key = state.config.object_key(filename);
    let url = state
        .storage
        .presign_put(&key, content_type, state.config.presign_expires_secs)
        .await
        .map_err(|e| AppError::Storage(format!("presign {}: {}", key, e)))?;

    tracing::info!(
        "🔏 Issued write credential for key={} content_type={}",
        key,
        content_type.unwrap_or("-")
    );

    Ok(Json(WriteCredential { url }))
}

#[utoipa::path(
    get,
    path = "/api/r2/list",
    responses(
        (status = 200, description = "Objects under the upload prefix", body = ListResponse),
        (status = 500, description = "Listing failed")
    ),
    tag = "uploads"
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>, AppError> {
    let objects = state
        .storage
        .list_objects(&state.config.upload_prefix)
        .await
        .map_err(|e| AppError::Storage(format!("list {}: {}", state.config.upload_prefix, e)))?;

    tracing::debug!("Listed {} objects", objects.len());

    Ok(Json(ListResponse { objects }))
}
