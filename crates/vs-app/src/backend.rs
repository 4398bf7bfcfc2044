mod routes;
mod schemas;
mod state;

use std::sync::Arc;
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use crate::backend::routes::api_routes;
use crate::backend::state::ApiState;
use crate::config::AppConfig;
use crate::generator::Generator;

pub fn router(generator: Arc<Generator>, config: &AppConfig) -> Router {
    let state = ApiState::new(generator, config);

    Router::new()
        .merge(api_routes(config.upload_max_bytes))
        .with_state(Arc::new(state))
}

/// Serve the API until ctrl-c
pub async fn serve(generator: Arc<Generator>, config: &AppConfig) -> anyhow::Result<()> {
    let app = router(generator.clone(), config);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Starting backend server on port {}", config.port);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Server stopped, cancelling pollers");
    generator.shutdown();
    Ok(())
}
