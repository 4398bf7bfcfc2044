use tracing::{debug, info, warn};
use vs_core::{GenError, GenerationJob, GenerationRequest};
use crate::generator::Generator;
use crate::generator::gallery::UpdateOutcome;
use crate::upstream::CreateJobParams;

impl Generator {
    /// Submit one generation.
    ///
    /// Validation and credential problems come back as `Err` with the gallery
    /// untouched. Otherwise the job is inserted optimistically, created
    /// upstream once, and returned: pending with its upstream id and a live
    /// poller, or failed with the upstream error recorded on it.
    pub async fn submit(&self, request: GenerationRequest) -> Result<GenerationJob, GenError> {
        let request = request.validate()?;

        let client = self.client();
        if !client.has_credential() {
            return Err(GenError::missing_credential());
        }

        let slot = self.reserve_slot()?;

        let epoch = self.gallery.epoch();
        let mut job = GenerationJob::pending(&request);
        self.gallery.upsert(job.clone());

        info!(
            local_id = %job.key.local_id,
            upstream = client.name(),
            aspect_ratio = request.aspect_ratio.id(),
            resolution = request.resolution.id(),
            duration = request.duration.id(),
            "Submitting generation"
        );

        let created = client.create_job(&CreateJobParams::from(&request)).await;

        let remote = match created {
            Ok(remote) => remote,
            Err(e) => {
                warn!(local_id = %job.key.local_id, error = %e, "Failed to create generation");
                job.fail(e.to_string());
                return match self.gallery.update(epoch, job.clone()) {
                    UpdateOutcome::Stale => Err(e),
                    UpdateOutcome::Updated | UpdateOutcome::Missing => Ok(job),
                };
            }
        };

        job.bind_remote(remote.id);
        match self.gallery.update(epoch, job.clone()) {
            UpdateOutcome::Updated => {
                info!(local_id = %job.key.local_id, job_id = %job.id(), "Generation accepted");
                self.start_poller(client, job.clone(), slot);
            }
            // Credential switched while the create call was out; this job
            // belongs to a gallery that no longer exists.
            UpdateOutcome::Stale => {
                debug!(local_id = %job.key.local_id, "Gallery reset during submission, dropping job");
            }
            // Deleted by the user before upstream answered
            UpdateOutcome::Missing => {
                info!(job_id = %job.id(), "Generation deleted while being created, removing upstream");
                if let Err(e) = client.delete_job(&job.id()).await {
                    warn!(job_id = %job.id(), error = %e, "Failed to delete orphaned generation");
                }
            }
        }
        Ok(job)
    }
}
