use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vs_core::{AspectRatio, GenerationJob, JobStatus, Resolution, VideoDuration};
use crate::generator::pager::PageOutcome;

/// A gallery entry as the browser sees it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationView {
    pub id: String,
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

impl From<GenerationJob> for GenerationView {
    fn from(job: GenerationJob) -> Self {
        Self {
            id: job.id(),
            prompt: job.prompt,
            status: job.status,
            aspect_ratio: job.aspect_ratio,
            resolution: job.resolution,
            duration: job.duration,
            reference_image: job.reference_image,
            video_url: job.video_url,
            thumbnail_url: job.thumbnail_url,
            error_message: job.error_message,
            created_at: job.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryResponse {
    pub generations: Vec<GenerationView>,
    pub has_more: bool,
    pub active_generations: usize,
    /// Entries not yet completed or failed
    pub pending_count: usize,
    /// A page fetch is in flight
    pub loading: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadMoreResponse {
    pub outcome: String,
    pub appended: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub gallery: GalleryResponse,
}

impl LoadMoreResponse {
    pub fn new(outcome: PageOutcome, gallery: GalleryResponse) -> Self {
        let (name, appended, error) = match outcome {
            PageOutcome::Loaded { appended } => ("loaded", appended, None),
            PageOutcome::Busy => ("busy", 0, None),
            PageOutcome::Exhausted => ("exhausted", 0, None),
            PageOutcome::Failed(e) => ("failed", 0, Some(e)),
            PageOutcome::Stale => ("stale", 0, None),
        };

        Self {
            outcome: name.to_string(),
            appended,
            error,
            gallery,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub has_credential: bool,
    #[serde(flatten)]
    pub gallery: GalleryResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vs_core::GenerationRequest;

    #[test]
    fn test_view_exposes_best_id() {
        let mut job = GenerationJob::pending(&GenerationRequest::new("dunes"));
        let view = GenerationView::from(job.clone());
        assert_eq!(view.id, job.key.local_id.to_string());

        job.bind_remote("luma-1");
        let json = serde_json::to_value(GenerationView::from(job)).unwrap();
        assert_eq!(json["id"], "luma-1");
        assert_eq!(json["aspectRatio"], "16:9");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_load_more_flattens_gallery() {
        let gallery = GalleryResponse {
            generations: vec![],
            has_more: false,
            active_generations: 0,
            pending_count: 0,
            loading: false,
        };
        let json = serde_json::to_value(LoadMoreResponse::new(PageOutcome::Failed("boom".into()), gallery)).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["hasMore"], false);
    }
}
