pub mod luma;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vs_core::{AspectRatio, GenError, GenerationJob, GenerationRequest, JobKey, JobStatus, Resolution, VideoDuration};

pub use luma::LumaClient;

/// Credential handed to an upstream client at construction time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credential {
    api_key: Option<String>,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        let trimmed = key.trim();
        Self {
            api_key: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fails fast when no key was configured
    pub fn api_key(&self) -> Result<&str, GenError> {
        self.api_key.as_deref().ok_or_else(GenError::missing_credential)
    }
}

/// Parameters for a create call, already in upstream terms
#[derive(Debug, Clone, PartialEq)]
pub struct CreateJobParams {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub duration: VideoDuration,
    pub reference_image: Option<String>,
}

impl From<&GenerationRequest> for CreateJobParams {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            prompt: request.prompt.clone(),
            aspect_ratio: request.aspect_ratio,
            resolution: request.resolution,
            duration: request.duration,
            reference_image: request.reference_image.clone(),
        }
    }
}

/// A job as upstream reports it
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJob {
    pub id: String,
    pub status: JobStatus,
    pub prompt: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<Resolution>,
    pub duration: Option<VideoDuration>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteJob {
    #[cfg(test)]
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            prompt: None,
            aspect_ratio: None,
            resolution: None,
            duration: None,
            video_url: None,
            thumbnail_url: None,
            failure_reason: None,
            created_at: None,
        }
    }

    #[cfg(test)]
    pub fn completed(id: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Completed,
            video_url: Some(video_url.into()),
            ..Self::pending(id)
        }
    }

    #[cfg(test)]
    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            failure_reason: Some(reason.into()),
            ..Self::pending(id)
        }
    }

    #[cfg(test)]
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Gallery entry for a job first seen in a listing
    pub fn into_job(self) -> GenerationJob {
        GenerationJob {
            key: JobKey::remote(self.id),
            prompt: self.prompt.unwrap_or_else(|| "Unknown prompt".to_string()),
            status: self.status,
            aspect_ratio: self.aspect_ratio.unwrap_or_default(),
            resolution: self.resolution.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            reference_image: None,
            video_url: self.video_url,
            thumbnail_url: self.thumbnail_url,
            error_message: self.failure_reason,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobPage {
    pub jobs: Vec<RemoteJob>,
    pub has_more: bool,
    /// Entries the upstream returned but that could not be parsed
    pub skipped: usize,
}

impl JobPage {
    /// Raw number of entries the upstream returned for this page
    pub fn fetched(&self) -> usize {
        self.jobs.len() + self.skipped
    }
}

/// The third-party generation API, as the generator sees it.
///
/// Every call requires a credential; implementations fail with
/// [`GenError::Auth`] before touching the network when none is configured.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    fn name(&self) -> &str;

    fn has_credential(&self) -> bool;

    async fn create_job(&self, params: &CreateJobParams) -> Result<RemoteJob, GenError>;

    async fn get_job(&self, id: &str) -> Result<RemoteJob, GenError>;

    /// Newest first
    async fn list_jobs(&self, offset: usize, limit: usize) -> Result<JobPage, GenError>;

    async fn delete_job(&self, id: &str) -> Result<(), GenError>;
}
