use std::sync::Arc;
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use log::info;
use vs_core::GenError;
use crate::backend::schemas::UploadResponse;
use crate::backend::state::ApiState;
use crate::error::AppError;

pub async fn upload_image(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GenError::validation(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mime_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| GenError::validation(format!("Malformed upload: {}", e)))?;

        let upload = state.uploads.store(&bytes, &mime_type).await?;
        info!("Reference image cached at {}", upload.path.display());
        return Ok(Json(UploadResponse { url: upload.url }));
    }

    Err(GenError::validation("No file uploaded").into())
}

pub async fn serve_upload(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    match state.uploads.open(&name).await? {
        Some((bytes, content_type)) => Ok(([(header::CONTENT_TYPE, content_type)], bytes)),
        None => Err(AppError::NotFound(format!("Upload '{}'", name))),
    }
}
