//! Scripted upstream used by the generator tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use vs_core::GenError;
use super::{CreateJobParams, JobPage, RemoteJob, UpstreamClient};

#[derive(Default)]
pub struct MockUpstream {
    no_credential: bool,
    create_gate: Option<Arc<Notify>>,
    list_gate: Option<Arc<Notify>>,
    delete_error: Mutex<Option<GenError>>,
    creates: Mutex<VecDeque<Result<RemoteJob, GenError>>>,
    // The last scripted response for an id repeats forever
    scripts: Mutex<HashMap<String, VecDeque<Result<RemoteJob, GenError>>>>,
    pages: Mutex<HashMap<usize, Result<JobPage, GenError>>>,
    create_calls: Mutex<Vec<CreateJobParams>>,
    get_calls: Mutex<HashMap<String, usize>>,
    list_calls: Mutex<Vec<(usize, usize)>>,
    delete_calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_credential(mut self) -> Self {
        self.no_credential = true;
        self
    }

    /// `create_job` blocks until the gate is notified
    pub fn with_create_gate(mut self, gate: Arc<Notify>) -> Self {
        self.create_gate = Some(gate);
        self
    }

    pub fn with_list_gate(mut self, gate: Arc<Notify>) -> Self {
        self.list_gate = Some(gate);
        self
    }

    /// Every `delete_job` fails with `error` until cleared
    pub fn fail_deletes(&self, error: Option<GenError>) {
        *self.delete_error.lock() = error;
    }

    pub fn push_create(self, result: Result<RemoteJob, GenError>) -> Self {
        self.creates.lock().push_back(result);
        self
    }

    pub fn script(self, id: &str, responses: Vec<Result<RemoteJob, GenError>>) -> Self {
        self.scripts.lock().insert(id.to_string(), responses.into());
        self
    }

    pub fn page(self, offset: usize, result: Result<JobPage, GenError>) -> Self {
        self.pages.lock().insert(offset, result);
        self
    }

    pub fn create_calls(&self) -> Vec<CreateJobParams> {
        self.create_calls.lock().clone()
    }

    pub fn get_calls(&self, id: &str) -> usize {
        self.get_calls.lock().get(id).copied().unwrap_or(0)
    }

    pub fn list_calls(&self) -> Vec<(usize, usize)> {
        self.list_calls.lock().clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().clone()
    }

    fn authorize(&self) -> Result<(), GenError> {
        if self.no_credential {
            return Err(GenError::missing_credential());
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    fn name(&self) -> &str {
        "Mock"
    }

    fn has_credential(&self) -> bool {
        !self.no_credential
    }

    async fn create_job(&self, params: &CreateJobParams) -> Result<RemoteJob, GenError> {
        self.authorize()?;
        self.create_calls.lock().push(params.clone());

        if let Some(gate) = &self.create_gate {
            gate.notified().await;
        }

        let scripted = self.creates.lock().pop_front();
        scripted.unwrap_or_else(|| {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteJob::pending(format!("job-{}", n)))
        })
    }

    async fn get_job(&self, id: &str) -> Result<RemoteJob, GenError> {
        self.authorize()?;
        *self.get_calls.lock().entry(id.to_string()).or_default() += 1;

        let mut scripts = self.scripts.lock();
        match scripts.get_mut(id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| Ok(RemoteJob::pending(id))),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| Ok(RemoteJob::pending(id))),
            None => Ok(RemoteJob::pending(id)),
        }
    }

    async fn list_jobs(&self, offset: usize, limit: usize) -> Result<JobPage, GenError> {
        self.authorize()?;
        self.list_calls.lock().push((offset, limit));

        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }

        self.pages
            .lock()
            .get(&offset)
            .cloned()
            .unwrap_or_else(|| Ok(JobPage::default()))
    }

    async fn delete_job(&self, id: &str) -> Result<(), GenError> {
        self.authorize()?;
        self.delete_calls.lock().push(id.to_string());
        match self.delete_error.lock().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
