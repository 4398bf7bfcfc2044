use std::sync::Arc;
use crate::config::AppConfig;
use crate::generator::Generator;
use crate::upload::UploadCache;

pub struct ApiState {
    pub generator: Arc<Generator>,
    pub uploads: UploadCache,
    pub api_url: String,
}

impl ApiState {
    pub fn new(generator: Arc<Generator>, config: &AppConfig) -> Self {
        Self {
            generator,
            uploads: UploadCache::new(
                config.upload_dir.clone(),
                config.public_base_url.clone(),
                config.upload_max_bytes,
            ),
            api_url: config.api_url.clone(),
        }
    }
}
