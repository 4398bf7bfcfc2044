mod backend;
mod config;
mod error;
mod generator;
mod upload;
mod upstream;

use std::sync::Arc;
use tracing::info;
use crate::config::AppConfig;
use crate::generator::Generator;
use crate::upstream::{Credential, LumaClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    let credential = config.api_key.clone().map(Credential::new).unwrap_or_else(Credential::none);
    let has_credential = credential.is_set();

    let client = LumaClient::new(config.api_url.clone(), credential)?;
    let generator = Arc::new(Generator::new(Arc::new(client), config.generator()));

    if has_credential {
        let outcome = generator.load_more().await;
        info!(?outcome, "Loaded first gallery page");
    } else {
        info!("No API key configured, waiting for PUT /api/settings");
    }

    backend::serve(generator, &config).await
}
