use std::sync::Arc;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use crate::backend::routes::generations::{delete_generation, list_generations, load_more, submit_generation};
use crate::backend::routes::settings::update_settings;
use crate::backend::routes::upload::{serve_upload, upload_image};
use crate::backend::schemas::{GalleryResponse, GenerationView};
use crate::backend::state::ApiState;
use crate::generator::Generator;

mod generations;
mod settings;
mod upload;

/// Multipart framing on top of the raw image bytes
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn api_routes(upload_max_bytes: usize) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/generations", post(submit_generation).get(list_generations))
        .route("/api/generations/more", post(load_more))
        .route("/api/generations/{id}", delete(delete_generation))
        .route("/api/settings", put(update_settings))
        .route(
            "/api/upload",
            post(upload_image).layer(DefaultBodyLimit::max(upload_max_bytes + UPLOAD_OVERHEAD_BYTES)),
        )
        .route("/uploads/{name}", get(serve_upload))
}

pub(crate) fn gallery_response(generator: &Generator) -> GalleryResponse {
    GalleryResponse {
        generations: generator.snapshot().into_iter().map(GenerationView::from).collect(),
        has_more: generator.has_more(),
        active_generations: generator.active_generations(),
        pending_count: generator.gallery().pending_count(),
        loading: generator.is_loading(),
    }
}
