//! Luma Dream Machine REST client
//!
//! Talks to the `generations` endpoints of the Dream Machine API with the
//! `ray-2` model.
use std::time::Duration;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vs_core::{AspectRatio, GenError, JobStatus, Resolution, VideoDuration};
use super::{CreateJobParams, Credential, JobPage, RemoteJob, UpstreamClient};

pub const DEFAULT_API_URL: &str = "https://api.lumalabs.ai/dream-machine/v1";
const MODEL: &str = "ray-2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct LumaClient {
    base_url: String,
    credential: Credential,
    client: reqwest::Client,
}

impl LumaClient {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            client,
        })
    }

    fn generations_url(&self) -> String {
        format!("{}/generations", self.base_url)
    }

    fn generation_url(&self, id: &str) -> String {
        format!("{}/generations/{}", self.base_url, id)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GenError> {
        let api_key = self.credential.api_key()?;

        let response = request
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GenError::upstream(format!("Request to Luma failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::warn!("Luma responded with HTTP {}: {}", status, body);
        Err(error_from_body(status, &body))
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, GenError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GenError::upstream(format!("Malformed response from Luma: {}", e)))
    }
}

#[async_trait]
impl UpstreamClient for LumaClient {
    fn name(&self) -> &str {
        "Luma"
    }

    fn has_credential(&self) -> bool {
        self.credential.is_set()
    }

    async fn create_job(&self, params: &CreateJobParams) -> Result<RemoteJob, GenError> {
        let body = CreateGenerationBody::from(params);
        let response = self
            .send(self.client.post(self.generations_url()).json(&body))
            .await?;

        let generation: LumaGeneration = Self::read_json(response).await?;
        generation.try_into()
    }

    async fn get_job(&self, id: &str) -> Result<RemoteJob, GenError> {
        let response = self.send(self.client.get(self.generation_url(id))).await?;

        let generation: LumaGeneration = Self::read_json(response).await?;
        generation.try_into()
    }

    async fn list_jobs(&self, offset: usize, limit: usize) -> Result<JobPage, GenError> {
        let response = self
            .send(
                self.client
                    .get(self.generations_url())
                    .query(&[("limit", limit), ("offset", offset)]),
            )
            .await?;

        let list: LumaGenerationList = Self::read_json(response).await?;
        Ok(list.into())
    }

    async fn delete_job(&self, id: &str) -> Result<(), GenError> {
        self.send(self.client.delete(self.generation_url(id))).await?;
        Ok(())
    }
}

fn error_from_body(status: reqwest::StatusCode, body: &str) -> GenError {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<serde_json::Value>,
        message: Option<String>,
        code: Option<String>,
    }

    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|b| b.code.clone())
        .or_else(|| Some(status.as_u16().to_string()));

    let message = parsed
        .and_then(|b| {
            b.detail
                .map(|d| match d {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .or(b.message)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Luma API error: HTTP {}", status));

    GenError::Upstream { message, code }
}

#[derive(Debug, Serialize)]
struct CreateGenerationBody {
    prompt: String,
    model: &'static str,
    resolution: &'static str,
    aspect_ratio: &'static str,
    duration: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyframes: Option<Keyframes>,
}

#[derive(Debug, Serialize)]
struct Keyframes {
    frame0: Keyframe,
}

#[derive(Debug, Serialize)]
struct Keyframe {
    #[serde(rename = "type")]
    kind: &'static str,
    url: String,
}

impl From<&CreateJobParams> for CreateGenerationBody {
    fn from(params: &CreateJobParams) -> Self {
        Self {
            prompt: params.prompt.clone(),
            model: MODEL,
            resolution: params.resolution.id(),
            aspect_ratio: params.aspect_ratio.id(),
            duration: params.duration.id(),
            keyframes: params.reference_image.as_ref().map(|url| Keyframes {
                frame0: Keyframe {
                    kind: "image",
                    url: url.clone(),
                },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LumaGeneration {
    id: Option<String>,
    state: Option<String>,
    failure_reason: Option<String>,
    created_at: Option<DateTime<Utc>>,
    assets: Option<LumaAssets>,
    request: Option<LumaRequestEcho>,
}

#[derive(Debug, Deserialize)]
struct LumaAssets {
    video: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LumaRequestEcho {
    prompt: Option<String>,
    aspect_ratio: Option<String>,
    resolution: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LumaGenerationList {
    #[serde(default)]
    generations: Vec<LumaGeneration>,
    has_more: Option<bool>,
}

fn parse_state(state: &str) -> Option<JobStatus> {
    match state {
        "queued" | "dreaming" | "pending" | "processing" => Some(JobStatus::Pending),
        "completed" => Some(JobStatus::Completed),
        "failed" => Some(JobStatus::Failed),
        _ => None,
    }
}

impl TryFrom<LumaGeneration> for RemoteJob {
    type Error = GenError;

    fn try_from(generation: LumaGeneration) -> Result<Self, Self::Error> {
        let id = generation
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GenError::upstream("Malformed response from Luma: generation has no id"))?;

        let state = generation.state.unwrap_or_default();
        let status = parse_state(&state).ok_or_else(|| {
            GenError::upstream(format!("Malformed response from Luma: unknown state '{}'", state))
        })?;

        let (video_url, thumbnail_url) = match generation.assets {
            Some(assets) => (assets.video, assets.image),
            None => (None, None),
        };
        let echo = generation.request;

        Ok(RemoteJob {
            id,
            status,
            prompt: echo.as_ref().and_then(|r| r.prompt.clone()),
            aspect_ratio: echo
                .as_ref()
                .and_then(|r| r.aspect_ratio.as_deref())
                .and_then(AspectRatio::from_id),
            resolution: echo
                .as_ref()
                .and_then(|r| r.resolution.as_deref())
                .and_then(Resolution::from_id),
            duration: echo
                .as_ref()
                .and_then(|r| r.duration.as_deref())
                .and_then(VideoDuration::from_id),
            video_url: video_url.filter(|u| !u.is_empty()),
            thumbnail_url: thumbnail_url.filter(|u| !u.is_empty()),
            failure_reason: generation.failure_reason,
            created_at: generation.created_at,
        })
    }
}

impl From<LumaGenerationList> for JobPage {
    fn from(list: LumaGenerationList) -> Self {
        // A single bad entry must not wedge paging at this offset
        let total = list.generations.len();
        let mut jobs: Vec<RemoteJob> = list
            .generations
            .into_iter()
            .filter_map(|generation| match RemoteJob::try_from(generation) {
                Ok(job) => Some(job),
                Err(e) => {
                    log::warn!("Skipping listing entry: {}", e);
                    None
                }
            })
            .collect();
        let skipped = total - jobs.len();

        // Newest first; entries without a timestamp sink to the bottom
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        JobPage {
            jobs,
            has_more: list.has_more.unwrap_or(true),
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CreateJobParams {
        CreateJobParams {
            prompt: "a cat on a skateboard".into(),
            aspect_ratio: AspectRatio::Landscape,
            resolution: Resolution::Hd,
            duration: VideoDuration::Short,
            reference_image: None,
        }
    }

    #[test]
    fn test_create_body_serialization() {
        let body = serde_json::to_value(CreateGenerationBody::from(&params())).unwrap();
        assert_eq!(body["model"], "ray-2");
        assert_eq!(body["aspect_ratio"], "16:9");
        assert_eq!(body["resolution"], "720p");
        assert_eq!(body["duration"], "5s");
        assert!(body.get("keyframes").is_none());

        let mut with_image = params();
        with_image.reference_image = Some("https://x/key.png".into());
        let body = serde_json::to_value(CreateGenerationBody::from(&with_image)).unwrap();
        assert_eq!(body["keyframes"]["frame0"]["type"], "image");
        assert_eq!(body["keyframes"]["frame0"]["url"], "https://x/key.png");
    }

    #[test]
    fn test_generation_parsing() {
        let json = r#"{
            "id": "abc123",
            "state": "completed",
            "created_at": "2024-11-02T10:00:00Z",
            "assets": {"video": "https://x/video.mp4", "image": "https://x/thumb.jpg"},
            "request": {"prompt": "waves", "aspect_ratio": "9:16", "duration": "9s"}
        }"#;
        let generation: LumaGeneration = serde_json::from_str(json).unwrap();
        let job = RemoteJob::try_from(generation).unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.video_url.as_deref(), Some("https://x/video.mp4"));
        assert_eq!(job.thumbnail_url.as_deref(), Some("https://x/thumb.jpg"));
        assert_eq!(job.aspect_ratio, Some(AspectRatio::Portrait));
        assert_eq!(job.duration, Some(VideoDuration::Long));
        assert_eq!(job.prompt.as_deref(), Some("waves"));
    }

    #[test]
    fn test_dreaming_is_pending_and_unknown_state_is_malformed() {
        let generation: LumaGeneration =
            serde_json::from_str(r#"{"id": "a", "state": "dreaming"}"#).unwrap();
        assert_eq!(RemoteJob::try_from(generation).unwrap().status, JobStatus::Pending);

        let generation: LumaGeneration =
            serde_json::from_str(r#"{"id": "a", "state": "exploded"}"#).unwrap();
        assert!(matches!(RemoteJob::try_from(generation), Err(GenError::Upstream { .. })));
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let json = r#"{
            "has_more": false,
            "generations": [
                {"id": "old", "state": "completed", "created_at": "2024-01-01T00:00:00Z"},
                {"id": "new", "state": "queued", "created_at": "2024-06-01T00:00:00Z"}
            ]
        }"#;
        let list: LumaGenerationList = serde_json::from_str(json).unwrap();
        let page = JobPage::from(list);

        let ids: Vec<_> = page.jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert!(!page.has_more);
    }

    #[test]
    fn test_malformed_listing_entries_are_skipped() {
        let json = r#"{
            "has_more": true,
            "generations": [
                {"id": "good", "state": "completed", "created_at": "2024-06-01T00:00:00Z"},
                {"id": "weird", "state": "exploded"},
                {"state": "queued"}
            ]
        }"#;
        let list: LumaGenerationList = serde_json::from_str(json).unwrap();
        let page = JobPage::from(list);

        let ids: Vec<_> = page.jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
        assert_eq!(page.fetched(), 3);
        assert!(page.has_more);
    }

    #[test]
    fn test_error_body_mapping() {
        let err = error_from_body(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"detail": "Invalid aspect ratio"}"#,
        );
        assert_eq!(
            err,
            GenError::Upstream {
                message: "Invalid aspect ratio".into(),
                code: Some("400".into()),
            }
        );

        let err = error_from_body(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "Luma API error: HTTP 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        // Unroutable address: reaching the network would surface as Upstream, not Auth.
        let client = LumaClient::new("http://127.0.0.1:9", Credential::none()).unwrap();
        assert!(!client.has_credential());

        let err = client.create_job(&params()).await.unwrap_err();
        assert!(matches!(err, GenError::Auth(_)));
        assert!(matches!(client.list_jobs(0, 20).await, Err(GenError::Auth(_))));
    }
}
