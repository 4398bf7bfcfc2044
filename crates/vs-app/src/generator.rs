use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use vs_core::{GenError, GenerationJob};
use crate::generator::gallery::Gallery;
use crate::generator::pager::{GalleryPager, PageOutcome, DEFAULT_PAGE_SIZE};
use crate::generator::poller::{CompletionPoller, PollerConfig};
use crate::generator::scheduler::ScheduledTask;
use crate::upstream::UpstreamClient;

pub mod gallery;
pub mod pager;
pub mod poller;
pub mod scheduler;
mod submission;

pub const MAX_CONCURRENT_GENERATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub poller: PollerConfig,
    pub page_size: usize,
    pub max_concurrent: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent: MAX_CONCURRENT_GENERATIONS,
        }
    }
}

/// One gallery session against one upstream credential.
///
/// Owns the reconciled gallery, the pager, and one poller per in-flight job.
pub struct Generator {
    client: RwLock<Arc<dyn UpstreamClient>>,
    gallery: Gallery,
    pager: GalleryPager,
    slots: Mutex<Slots>,
    config: GeneratorConfig,
}

/// Live pollers plus submissions still waiting on their create call.
/// Both count against the concurrency cap.
#[derive(Default)]
struct Slots {
    pollers: HashMap<String, ScheduledTask>,
    reserved: usize,
}

impl Slots {
    fn active(&mut self) -> usize {
        self.pollers.retain(|_, task| !task.is_finished());
        self.pollers.len() + self.reserved
    }
}

/// A held place under the concurrency cap. Released on drop unless it was
/// handed over to a poller.
pub(crate) struct SlotReservation<'a> {
    generator: &'a Generator,
    held: bool,
}

impl SlotReservation<'_> {
    fn release(&mut self, slots: &mut Slots) {
        if std::mem::take(&mut self.held) {
            slots.reserved -= 1;
        }
    }
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        if self.held {
            let mut slots = self.generator.slots.lock();
            self.release(&mut slots);
        }
    }
}

impl Generator {
    pub fn new(client: Arc<dyn UpstreamClient>, config: GeneratorConfig) -> Self {
        Self {
            client: RwLock::new(client),
            gallery: Gallery::new(),
            pager: GalleryPager::new(config.page_size),
            slots: Mutex::new(Slots::default()),
            config,
        }
    }

    pub fn client(&self) -> Arc<dyn UpstreamClient> {
        self.client.read().clone()
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn snapshot(&self) -> Vec<GenerationJob> {
        self.gallery.snapshot()
    }

    pub fn has_more(&self) -> bool {
        self.gallery.cursor().has_more
    }

    /// Jobs being created or still followed by a live poller
    pub fn active_generations(&self) -> usize {
        self.slots.lock().active()
    }

    /// Take a place under the concurrency cap, atomically with the check
    pub(crate) fn reserve_slot(&self) -> Result<SlotReservation<'_>, GenError> {
        let mut slots = self.slots.lock();
        let active = slots.active();
        if active >= self.config.max_concurrent {
            return Err(GenError::validation(format!(
                "{} of {} generations already in progress",
                active, self.config.max_concurrent
            )));
        }

        slots.reserved += 1;
        Ok(SlotReservation {
            generator: self,
            held: true,
        })
    }

    pub fn is_loading(&self) -> bool {
        self.pager.is_loading()
    }

    pub async fn load_more(&self) -> PageOutcome {
        let client = self.client();
        self.pager.on_sentinel_visible(client.as_ref(), &self.gallery).await
    }

    /// Start following `job` unless a live poller already owns its id.
    /// The reservation turns into the poller's slot in the same step.
    pub(crate) fn start_poller(
        &self,
        client: Arc<dyn UpstreamClient>,
        job: GenerationJob,
        mut slot: SlotReservation<'_>,
    ) {
        let Some(remote_id) = job.key.remote_id.clone() else {
            return;
        };

        let mut slots = self.slots.lock();
        slot.release(&mut slots);
        slots.pollers.retain(|_, task| !task.is_finished());
        if slots.pollers.contains_key(&remote_id) {
            debug!(job_id = %remote_id, "Poller already running");
            return;
        }

        let poller = CompletionPoller::new(client, self.gallery.clone(), self.config.poller, job);
        let task = ScheduledTask::spawn(format!("poll {}", remote_id), async move {
            poller.run().await;
        });
        slots.pollers.insert(remote_id, task);
    }

    fn cancel_poller(&self, remote_id: &str) {
        let task = self.slots.lock().pollers.remove(remote_id);
        if let Some(mut task) = task {
            debug!(task = task.name(), "Cancelling poller");
            task.cancel();
        }
    }

    fn cancel_all_pollers(&self) {
        let drained: Vec<ScheduledTask> = self.slots.lock().pollers.drain().map(|(_, t)| t).collect();
        for mut task in drained {
            task.cancel();
        }
    }

    /// Delete upstream and drop the job from the gallery. If the upstream
    /// delete fails the job and its poller are left as they were.
    pub async fn delete(&self, id: &str) -> Result<GenerationJob, GenError> {
        let job = self
            .gallery
            .get(id)
            .ok_or_else(|| GenError::validation(format!("Unknown generation '{}'", id)))?;

        if let Some(remote_id) = job.key.remote_id.as_deref() {
            self.client().delete_job(remote_id).await?;
            self.cancel_poller(remote_id);
        }

        self.gallery.remove(id);
        info!(job_id = %id, "Generation deleted");
        Ok(job)
    }

    /// Point the session at a different upstream (new credential): pollers
    /// stop, gallery and cursor are cleared.
    pub fn switch_client(&self, client: Arc<dyn UpstreamClient>) {
        self.cancel_all_pollers();
        self.gallery.reset();
        *self.client.write() = client;
        info!("Upstream client switched, gallery reset");
    }

    pub fn shutdown(&self) {
        self.cancel_all_pollers();
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.cancel_all_pollers();
    }
}
