use std::sync::Arc;
use axum::Json;
use axum::extract::State;
use log::{info, warn};
use vs_core::GenError;
use crate::backend::routes::gallery_response;
use crate::backend::schemas::{SettingsRequest, SettingsResponse};
use crate::backend::state::ApiState;
use crate::error::AppError;
use crate::generator::pager::PageOutcome;
use crate::upstream::{Credential, LumaClient};

/// Replace the session credential. The gallery restarts from the first page.
pub async fn update_settings(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    let credential = Credential::new(request.api_key);
    if !credential.is_set() {
        return Err(GenError::validation("API key must not be empty").into());
    }

    let client = LumaClient::new(state.api_url.clone(), credential)
        .map_err(|e| AppError::BackendError(e.to_string()))?;

    state.generator.switch_client(Arc::new(client));
    info!("API key updated, reloading gallery");

    if let PageOutcome::Failed(e) = state.generator.load_more().await {
        warn!("First page after key change failed: {}", e);
    }

    Ok(Json(SettingsResponse {
        has_credential: true,
        gallery: gallery_response(&state.generator),
    }))
}
