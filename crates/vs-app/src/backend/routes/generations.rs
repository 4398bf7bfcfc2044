use std::sync::Arc;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use log::info;
use vs_core::GenerationRequest;
use crate::backend::routes::gallery_response;
use crate::backend::schemas::{GalleryResponse, GenerationView, LoadMoreResponse};
use crate::backend::state::ApiState;
use crate::error::AppError;

pub async fn submit_generation(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<GenerationView>), AppError> {
    let job = state.generator.submit(request).await?;
    info!("Generation {} submitted ({:?})", job.id(), job.status);

    Ok((StatusCode::ACCEPTED, Json(GenerationView::from(job))))
}

pub async fn list_generations(State(state): State<Arc<ApiState>>) -> Json<GalleryResponse> {
    Json(gallery_response(&state.generator))
}

pub async fn load_more(State(state): State<Arc<ApiState>>) -> Json<LoadMoreResponse> {
    let outcome = state.generator.load_more().await;
    Json(LoadMoreResponse::new(outcome, gallery_response(&state.generator)))
}

pub async fn delete_generation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.generator.gallery().get(&id).is_none() {
        return Err(AppError::NotFound(format!("Generation '{}'", id)));
    }

    state.generator.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
