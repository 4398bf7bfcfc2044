use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::GenError;
use crate::model_types::{AspectRatio, Resolution, VideoDuration};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Completed and failed jobs never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Two-phase job identity.
///
/// `local_id` exists from the moment a job is created on this side;
/// `remote_id` is filled in once upstream accepts the job and never changes
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobKey {
    pub local_id: Uuid,
    pub remote_id: Option<String>,
}

impl JobKey {
    pub fn local() -> Self {
        Self {
            local_id: Uuid::new_v4(),
            remote_id: None,
        }
    }

    /// Key for a job first seen in an upstream listing
    pub fn remote(id: impl Into<String>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            remote_id: Some(id.into()),
        }
    }

    /// Public id: the upstream id once known, the local one before that
    pub fn id(&self) -> String {
        match &self.remote_id {
            Some(remote) => remote.clone(),
            None => self.local_id.to_string(),
        }
    }

    pub fn matches(&self, other: &JobKey) -> bool {
        if self.local_id == other.local_id {
            return true;
        }
        matches!((&self.remote_id, &other.remote_id), (Some(a), Some(b)) if a == b)
    }

    pub fn matches_id(&self, id: &str) -> bool {
        self.remote_id.as_deref() == Some(id) || self.local_id.to_string() == id
    }
}

/// Parameters for one generation, as submitted by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default, alias = "length")]
    pub duration: VideoDuration,
    #[serde(default)]
    pub reference_image: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            resolution: Resolution::default(),
            duration: VideoDuration::default(),
            reference_image: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_duration(mut self, duration: VideoDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_reference_image(mut self, url: impl Into<String>) -> Self {
        self.reference_image = Some(url.into());
        self
    }

    /// Returns a normalized copy: trimmed prompt, blank reference image dropped.
    pub fn validate(&self) -> Result<Self, GenError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(GenError::validation("Prompt is required"));
        }

        let reference_image = match self.reference_image.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Some(url.to_string())
            }
            Some(url) => {
                return Err(GenError::validation(format!(
                    "Reference image must be an http(s) URL, got '{}'",
                    url
                )));
            }
        };

        Ok(Self {
            prompt: prompt.to_string(),
            reference_image,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub key: JobKey,
    pub prompt: String,
    pub status: JobStatus,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub duration: VideoDuration,
    pub reference_image: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GenerationJob {
    /// Fresh pending job with a local id only
    pub fn pending(request: &GenerationRequest) -> Self {
        Self {
            key: JobKey::local(),
            prompt: request.prompt.clone(),
            status: JobStatus::Pending,
            aspect_ratio: request.aspect_ratio,
            resolution: request.resolution,
            duration: request.duration,
            reference_image: request.reference_image.clone(),
            video_url: None,
            thumbnail_url: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> String {
        self.key.id()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Attach the upstream id. Only the first binding sticks.
    pub fn bind_remote(&mut self, remote_id: impl Into<String>) -> bool {
        if self.key.remote_id.is_some() {
            return false;
        }
        self.key.remote_id = Some(remote_id.into());
        true
    }

    pub fn complete(&mut self, video_url: String, thumbnail_url: Option<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.video_url = Some(video_url);
        self.thumbnail_url = thumbnail_url;
        self.error_message = None;
        true
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.video_url = None;
        self.thumbnail_url = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_prompt() {
        let err = GenerationRequest::new("   \n\t").validate().unwrap_err();
        assert!(matches!(err, GenError::Validation(_)));
    }

    #[test]
    fn test_validate_normalizes() {
        let request = GenerationRequest::new("  a cat on a skateboard ")
            .with_reference_image("  ")
            .validate()
            .unwrap();
        assert_eq!(request.prompt, "a cat on a skateboard");
        assert_eq!(request.reference_image, None);

        let err = GenerationRequest::new("x")
            .with_reference_image("file:///etc/passwd")
            .validate()
            .unwrap_err();
        assert!(matches!(err, GenError::Validation(_)));
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"prompt":"waves","length":"9s"}"#).unwrap();
        assert_eq!(request.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(request.resolution, Resolution::Hd);
        assert_eq!(request.duration, VideoDuration::Long);
    }

    #[test]
    fn test_key_matching() {
        let local = JobKey::local();
        let mut bound = local.clone();
        bound.remote_id = Some("abc123".into());

        assert!(local.matches(&bound));
        assert!(bound.matches(&JobKey::remote("abc123")));
        assert!(!local.matches(&JobKey::remote("abc123")));
        assert_eq!(bound.id(), "abc123");
        assert!(bound.matches_id(&local.local_id.to_string()));
    }

    #[test]
    fn test_terminal_jobs_are_immutable() {
        let mut job = GenerationJob::pending(&GenerationRequest::new("waves"));
        assert!(job.bind_remote("r1"));
        assert!(!job.bind_remote("r2"));
        assert_eq!(job.id(), "r1");

        assert!(job.complete("https://x/video.mp4".into(), None));
        assert!(!job.fail("late failure"));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.error_message, None);
    }
}
