use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use advisordesk_core::{
    cas::{CasDataView, CasStatusView, CasUpload},
    constants::MAX_CAS_FILE_SIZE,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

/// Multipart overhead allowance so oversize documents still reach validation.
const UPLOAD_BODY_LIMIT: usize = MAX_CAS_FILE_SIZE * 2;

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn upload_cas(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<CasStatusView>> {
    let mut file: Option<UploadedFile> = None;
    let mut password: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read file content: {}", e))
                    })?
                    .to_vec();
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "password" => {
                password = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read password: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| {
        ApiError::BadRequest("Missing file in multipart request".to_string())
    })?;

    let view = state
        .cas_service
        .upload_cas(CasUpload {
            client_id: id,
            file_name: file.file_name,
            content_type: file.content_type,
            bytes: file.bytes,
            password,
        })
        .await?;
    Ok(Json(view))
}

async fn request_parse(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<CasStatusView>)> {
    let view = state.cas_service.request_parse(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

async fn get_cas_status(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CasStatusView>> {
    Ok(Json(state.cas_service.get_cas_status(&id)?))
}

async fn get_cas_data(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CasDataView>> {
    Ok(Json(state.cas_service.get_cas_data(&id)?))
}

async fn delete_cas(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CasStatusView>> {
    Ok(Json(state.cas_service.delete_cas(&id).await?))
}

async fn reset_cas_parse(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CasStatusView>> {
    Ok(Json(state.cas_service.reset_cas_parse(&id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/clients/{id}/cas",
            post(upload_cas)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
                .get(get_cas_data)
                .delete(delete_cas),
        )
        .route("/clients/{id}/cas/parse", post(request_parse))
        .route("/clients/{id}/cas/status", get(get_cas_status))
        .route("/clients/{id}/cas/reset", post(reset_cas_parse))
}
