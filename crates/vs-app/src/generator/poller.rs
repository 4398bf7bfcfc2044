use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use vs_core::{GenError, GenerationJob, JobStatus};
use crate::generator::gallery::{Gallery, UpdateOutcome};
use crate::upstream::{RemoteJob, UpstreamClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Polling,
    Completed,
    Failed(String),
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }
}

/// Follows one upstream job until it completes, fails or runs out of time,
/// publishing the terminal version of the job to the gallery exactly once.
///
/// The gallery epoch is captured at construction; after a reset the result
/// is dropped instead of landing in the new session's gallery.
pub struct CompletionPoller {
    client: Arc<dyn UpstreamClient>,
    gallery: Gallery,
    epoch: u64,
    config: PollerConfig,
    job: GenerationJob,
}

impl CompletionPoller {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        gallery: Gallery,
        config: PollerConfig,
        job: GenerationJob,
    ) -> Self {
        Self {
            client,
            epoch: gallery.epoch(),
            gallery,
            config,
            job,
        }
    }

    pub async fn run(mut self) -> PollState {
        let Some(remote_id) = self.job.key.remote_id.clone() else {
            return self.finish(PollState::Failed("Job has no upstream id".into()));
        };

        let start = Instant::now();
        let deadline = start + self.config.timeout;
        let mut ticker = tokio::time::interval_at(start + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(job_id = %remote_id, "Polling for completion");

        loop {
            tokio::select! {
                biased;
                _ = tokio::time::sleep_until(deadline) => {
                    warn!(job_id = %remote_id, "Polling timed out");
                    return self.finish(PollState::TimedOut);
                }
                _ = ticker.tick() => {
                    let report = self.client.get_job(&remote_id).await;
                    let next = self.observe(report);
                    if next.is_terminal() {
                        return self.finish(next);
                    }
                    debug!(job_id = %remote_id, "Still generating");
                }
            }
        }
    }

    /// Map one status report onto the state machine without publishing
    fn observe(&mut self, report: Result<RemoteJob, GenError>) -> PollState {
        match report {
            Ok(remote) => match remote.status {
                JobStatus::Pending => PollState::Polling,
                JobStatus::Completed => match remote.video_url.filter(|u| !u.trim().is_empty()) {
                    Some(url) => {
                        self.job.complete(url, remote.thumbnail_url);
                        PollState::Completed
                    }
                    None => PollState::Failed("Generation completed without a video URL".into()),
                },
                JobStatus::Failed => PollState::Failed(
                    remote
                        .failure_reason
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| "Generation failed".into()),
                ),
            },
            Err(e) => PollState::Failed(e.to_string()),
        }
    }

    fn finish(mut self, state: PollState) -> PollState {
        match &state {
            PollState::Completed => {
                info!(job_id = %self.job.id(), "Generation completed");
            }
            PollState::Failed(reason) => {
                warn!(job_id = %self.job.id(), %reason, "Generation failed");
                self.job.fail(reason.clone());
            }
            PollState::TimedOut => {
                self.job.fail(timeout_error(self.config.timeout).to_string());
            }
            PollState::Polling => return state,
        }

        let job_id = self.job.id();
        match self.gallery.update(self.epoch, self.job) {
            UpdateOutcome::Updated => {}
            outcome => debug!(%job_id, ?outcome, "Dropping poll result"),
        }
        state
    }
}

fn timeout_error(timeout: Duration) -> GenError {
    let secs = timeout.as_secs();
    let message = if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        format!(
            "Generation timed out after {} minute{}",
            minutes,
            if minutes == 1 { "" } else { "s" }
        )
    } else {
        format!("Generation timed out after {} seconds", secs)
    };
    GenError::Timeout(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scheduler::ScheduledTask;
    use crate::upstream::mock::MockUpstream;
    use vs_core::GenerationRequest;

    fn submitted(gallery: &Gallery, remote_id: &str) -> GenerationJob {
        let mut job = GenerationJob::pending(&GenerationRequest::new("a cat on a skateboard"));
        job.bind_remote(remote_id);
        gallery.upsert(job.clone());
        job
    }

    fn fast() -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_with_video_url() {
        let mock = Arc::new(MockUpstream::new().script(
            "abc123",
            vec![
                Ok(RemoteJob::pending("abc123")),
                Ok(RemoteJob::completed("abc123", "https://x/video.mp4").with_thumbnail("https://x/t.jpg")),
            ],
        ));
        let gallery = Gallery::new();
        let job = submitted(&gallery, "abc123");

        let state = CompletionPoller::new(mock.clone(), gallery.clone(), fast(), job).run().await;

        assert_eq!(state, PollState::Completed);
        assert_eq!(mock.get_calls("abc123"), 2);
        let stored = gallery.get("abc123").unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.video_url.as_deref(), Some("https://x/video.mp4"));
        assert_eq!(stored.thumbnail_url.as_deref(), Some("https://x/t.jpg"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_published_once_and_ticking_stops() {
        let mock = Arc::new(MockUpstream::new().script(
            "r1",
            vec![Ok(RemoteJob::pending("r1")), Ok(RemoteJob::failed("r1", "Content policy"))],
        ));
        let gallery = Gallery::new();
        let job = submitted(&gallery, "r1");

        let poller = CompletionPoller::new(mock.clone(), gallery.clone(), fast(), job);
        let _task = ScheduledTask::spawn("poll r1", async move {
            poller.run().await;
        });

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(mock.get_calls("r1"), 2);
        let stored = gallery.get("r1").unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("Content policy"));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(mock.get_calls("r1"), 2);
        assert_eq!(gallery.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_while_pending() {
        let mock = Arc::new(MockUpstream::new());
        let gallery = Gallery::new();
        let job = submitted(&gallery, "slow");

        let state = CompletionPoller::new(mock.clone(), gallery.clone(), fast(), job).run().await;

        assert_eq!(state, PollState::TimedOut);
        // Ticks at 5..25s; the 30s tick coincides with the deadline, which wins
        assert_eq!(mock.get_calls("slow"), 5);
        let stored = gallery.get("slow").unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("Generation timed out after 30 seconds"));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(mock.get_calls("slow"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_error_terminates_polling() {
        let mock = Arc::new(MockUpstream::new().script(
            "bad",
            vec![Err(GenError::upstream("Malformed response from Luma: unknown state 'x'"))],
        ));
        let gallery = Gallery::new();
        let job = submitted(&gallery, "bad");

        let state = CompletionPoller::new(mock.clone(), gallery.clone(), fast(), job).run().await;

        assert!(matches!(state, PollState::Failed(ref m) if m.contains("Malformed")));
        assert_eq!(mock.get_calls("bad"), 1);
        assert_eq!(gallery.get("bad").unwrap().status, JobStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_url_is_failure() {
        let mut completed = RemoteJob::completed("nourl", "");
        completed.video_url = None;
        let mock = Arc::new(MockUpstream::new().script("nourl", vec![Ok(completed)]));
        let gallery = Gallery::new();
        let job = submitted(&gallery, "nourl");

        let state = CompletionPoller::new(mock, gallery.clone(), fast(), job).run().await;

        assert!(matches!(state, PollState::Failed(_)));
        assert_eq!(gallery.get("nourl").unwrap().video_url, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_dropped_after_reset() {
        let mock = Arc::new(MockUpstream::new().script(
            "old",
            vec![Ok(RemoteJob::completed("old", "https://x/old.mp4"))],
        ));
        let gallery = Gallery::new();
        let job = submitted(&gallery, "old");
        let poller = CompletionPoller::new(mock.clone(), gallery.clone(), fast(), job);

        // New credential; the fresh session happens to list the same id
        gallery.reset();
        let listed = RemoteJob::pending("old").into_job();
        gallery.upsert(listed.clone());

        let state = poller.run().await;

        assert_eq!(state, PollState::Completed);
        assert_eq!(gallery.snapshot(), vec![listed]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_dropped_after_removal() {
        let mock = Arc::new(MockUpstream::new());
        let gallery = Gallery::new();
        let job = submitted(&gallery, "gone");
        gallery.remove("gone");

        let state = CompletionPoller::new(mock, gallery.clone(), fast(), job).run().await;

        assert_eq!(state, PollState::TimedOut);
        assert!(gallery.is_empty());
    }

    #[test]
    fn test_timeout_error() {
        assert_eq!(
            timeout_error(Duration::from_secs(300)),
            GenError::Timeout("Generation timed out after 5 minutes".into())
        );
        assert_eq!(
            timeout_error(Duration::from_secs(60)).to_string(),
            "Generation timed out after 1 minute"
        );
    }
}
