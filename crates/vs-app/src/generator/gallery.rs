use std::sync::Arc;
use parking_lot::Mutex;
use vs_core::GenerationJob;

/// The reconciled, most-recent-first job collection.
///
/// Cheap to clone; all clones share one collection. Every mutation takes the
/// lock for the duration of a single in-memory update and never across an
/// `.await`, so updates apply whole and in call order.
#[derive(Clone, Default)]
pub struct Gallery {
    inner: Arc<Mutex<GalleryInner>>,
}

#[derive(Default)]
struct GalleryInner {
    jobs: Vec<GenerationJob>,
    cursor: PageCursor,
    epoch: u64,
}

/// Result of [`Gallery::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// No entry with that id, e.g. deleted by the user meanwhile
    Missing,
    /// The gallery was reset after the caller read its epoch
    Stale,
}

/// Where the next historical page starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// `None` until the first page has been fetched
    pub offset: Option<usize>,
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            offset: None,
            has_more: true,
        }
    }
}

impl PageCursor {
    pub fn next_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

impl GalleryInner {
    fn append(&mut self, jobs: Vec<GenerationJob>) -> usize {
        let mut appended = 0;
        for job in jobs {
            if self.jobs.iter().any(|j| j.key.matches(&job.key)) {
                continue;
            }
            self.jobs.push(job);
            appended += 1;
        }
        appended
    }

    /// Put `job` in place of the first matching entry and drop any other
    /// matches. Hands the job back when nothing matched.
    fn replace(&mut self, job: GenerationJob) -> Option<GenerationJob> {
        let positions: Vec<usize> = self
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| j.key.matches(&job.key))
            .map(|(i, _)| i)
            .collect();

        let Some((&first, rest)) = positions.split_first() else {
            return Some(job);
        };
        for &extra in rest.iter().rev() {
            self.jobs.remove(extra);
        }
        self.jobs[first] = job;
        None
    }
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry with the same id in place, or insert at the front.
    ///
    /// An incoming key can match two entries when a listing picked up the
    /// upstream id before the local job was rebound to it; the first match
    /// takes the update and the other is dropped.
    pub fn upsert(&self, job: GenerationJob) {
        let mut inner = self.inner.lock();
        if let Some(job) = inner.replace(job) {
            inner.jobs.insert(0, job);
        }
    }

    /// Replace an existing entry in place. Never inserts.
    ///
    /// Used by work that started against an earlier view of the gallery:
    /// a reset since `epoch` or a removed entry means the update is dropped.
    pub fn update(&self, epoch: u64, job: GenerationJob) -> UpdateOutcome {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return UpdateOutcome::Stale;
        }

        match inner.replace(job) {
            None => UpdateOutcome::Updated,
            Some(_) => UpdateOutcome::Missing,
        }
    }

    /// Append a page of older jobs, skipping ids already present.
    /// Returns how many were appended.
    #[cfg(test)]
    pub fn append_page(&self, jobs: Vec<GenerationJob>) -> usize {
        self.inner.lock().append(jobs)
    }

    /// Clears jobs and cursor. Returns the new epoch.
    pub fn reset(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.jobs.clear();
        inner.cursor = PageCursor::default();
        inner.epoch += 1;
        inner.epoch
    }

    pub fn remove(&self, id: &str) -> Option<GenerationJob> {
        let mut inner = self.inner.lock();
        let position = inner.jobs.iter().position(|j| j.key.matches_id(id))?;
        Some(inner.jobs.remove(position))
    }

    pub fn get(&self, id: &str) -> Option<GenerationJob> {
        self.inner
            .lock()
            .jobs
            .iter()
            .find(|j| j.key.matches_id(id))
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<GenerationJob> {
        self.inner.lock().jobs.clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries not yet completed or failed, listed history included
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .jobs
            .iter()
            .filter(|j| j.status.is_active())
            .count()
    }

    pub fn cursor(&self) -> PageCursor {
        self.inner.lock().cursor
    }

    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Merge a fetched page and advance the cursor, unless a reset happened
    /// since `epoch` was read. Returns `None` for a stale page.
    pub(crate) fn apply_page(
        &self,
        epoch: u64,
        jobs: Vec<GenerationJob>,
        next_offset: usize,
        has_more: bool,
    ) -> Option<usize> {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return None;
        }

        let appended = inner.append(jobs);
        inner.cursor = PageCursor {
            offset: Some(next_offset),
            has_more,
        };
        Some(appended)
    }
}
