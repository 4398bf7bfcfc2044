use std::path::PathBuf;
use image::ImageFormat;
use tracing::info;
use uuid::Uuid;
use vs_core::GenError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub url: String,
    pub path: PathBuf,
}

/// Temporary on-disk cache for reference images.
///
/// Uploaded keyframes have to be reachable by the upstream API, so each one
/// gets a public URL under `<public_base_url>/uploads/`.
#[derive(Debug, Clone)]
pub struct UploadCache {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl UploadCache {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub async fn store(&self, bytes: &[u8], mime_type: &str) -> Result<Upload, GenError> {
        if !mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(GenError::validation("File must be an image"));
        }
        if bytes.is_empty() {
            return Err(GenError::validation("No file uploaded"));
        }
        if bytes.len() > self.max_bytes {
            return Err(GenError::validation(format!(
                "Image is too large ({} bytes, limit {})",
                bytes.len(),
                self.max_bytes
            )));
        }

        let format = image::guess_format(bytes)
            .map_err(|_| GenError::validation("File is not a recognizable image"))?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GenError::upstream(format!("Failed to prepare upload directory: {}", e)))?;

        let name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| GenError::upstream(format!("Failed to store upload: {}", e)))?;

        info!(path = %path.display(), size = bytes.len(), "Stored reference image");

        Ok(Upload {
            url: format!("{}/uploads/{}", self.public_base_url, name),
            path,
        })
    }

    /// Read back a cached upload with its content type
    pub async fn open(&self, name: &str) -> Result<Option<(Vec<u8>, &'static str)>, GenError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(GenError::validation("Invalid upload name"));
        }

        let path = self.dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(GenError::upstream(format!("Failed to read upload: {}", e))),
        };

        let content_type = ImageFormat::from_path(&path)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");

        Ok(Some((bytes, content_type)))
    }
}
