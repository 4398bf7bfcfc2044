use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use vs_core::{GenerationJob, JobStatus};
use crate::generator::gallery::Gallery;
use crate::upstream::{RemoteJob, UpstreamClient};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Loaded { appended: usize },
    /// Another fetch is still in flight
    Busy,
    Exhausted,
    Failed(String),
    /// The gallery was reset while the page was in flight
    Stale,
}

/// Loads history into the gallery one page at a time.
pub struct GalleryPager {
    page_size: usize,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl GalleryPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The sentinel near the end of the rendered list came into view.
    pub async fn on_sentinel_visible(&self, client: &dyn UpstreamClient, gallery: &Gallery) -> PageOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return PageOutcome::Busy;
        }
        let _in_flight = InFlight(&self.in_flight);

        let cursor = gallery.cursor();
        if !cursor.has_more {
            return PageOutcome::Exhausted;
        }

        let epoch = gallery.epoch();
        let offset = cursor.next_offset();
        debug!(offset, limit = self.page_size, "Fetching gallery page");

        let page = match client.list_jobs(offset, self.page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!(offset, error = %e, "Failed to load gallery page");
                return PageOutcome::Failed(e.to_string());
            }
        };

        let fetched = page.fetched();
        let has_more = page.has_more && fetched >= self.page_size;

        // Old failures are noise; only this session's failures are shown
        let jobs: Vec<GenerationJob> = page
            .jobs
            .into_iter()
            .filter(|j| j.status != JobStatus::Failed)
            .map(RemoteJob::into_job)
            .collect();

        match gallery.apply_page(epoch, jobs, offset + fetched, has_more) {
            Some(appended) => {
                debug!(offset, fetched, appended, has_more, "Gallery page applied");
                PageOutcome::Loaded { appended }
            }
            None => PageOutcome::Stale,
        }
    }
}

impl Default for GalleryPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
