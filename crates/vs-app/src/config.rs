use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use anyhow::Context;
use crate::generator::GeneratorConfig;
use crate::generator::poller::PollerConfig;
use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;
use crate::upstream::luma::DEFAULT_API_URL;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub api_url: String,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub page_size: usize,
    pub max_concurrent: usize,
    pub upload_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub public_base_url: String,
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment
    pub fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to read .env");
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = parse_or(&get, "PORT", 3000)?;
        let defaults = GeneratorConfig::default();

        let config = Self {
            port,
            api_url: get("LUMA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: get("LUMAAI_API_KEY"),
            poll_interval: Duration::from_secs(parse_or(
                &get,
                "POLL_INTERVAL_SECS",
                defaults.poller.interval.as_secs(),
            )?),
            poll_timeout: Duration::from_secs(parse_or(
                &get,
                "POLL_TIMEOUT_SECS",
                defaults.poller.timeout.as_secs(),
            )?),
            page_size: parse_or(&get, "PAGE_SIZE", defaults.page_size)?,
            max_concurrent: parse_or(&get, "MAX_CONCURRENT_GENERATIONS", defaults.max_concurrent)?,
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("vs-uploads")),
            upload_max_bytes: parse_or(&get, "UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
        };

        anyhow::ensure!(!config.poll_interval.is_zero(), "POLL_INTERVAL_SECS must be greater than 0");
        anyhow::ensure!(config.page_size > 0, "PAGE_SIZE must be greater than 0");

        Ok(config)
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            poller: PollerConfig {
                interval: self.poll_interval,
                timeout: self.poll_timeout,
            },
            page_size: self.page_size,
            max_concurrent: self.max_concurrent,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        None => Ok(default),
    }
}
