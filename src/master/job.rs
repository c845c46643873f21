//! The job runner seam between the project driver and the workers. One
//! job becomes one task: the runner builds the spec, picks a worker
//! round-robin, posts it, then parks until the worker's report arrives on
//! the report endpoint and is matched back by task id.

use crate::task::types::now_ms;
use crate::task::{Job, JobMeta, Resp, TaskReport, TaskSpec, TaskStatus};
use crate::worker::protocol::ENDPOINT_TASK_NEW;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Drives one job to completion and feeds the asynchronous worker
/// callbacks back in. The project driver is generic over this boundary.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Executes the job against a worker. Always returns the job meta,
    /// even on failure; the driver appends it before deciding to abort.
    async fn run_job(&self, job: Arc<dyn Job>, env: &serde_json::Value)
        -> (JobMeta, Result<()>);

    /// Meta of the in-flight job; zero-value (empty kind) when idle.
    fn live_job_meta(&self) -> JobMeta;

    /// Worker finished a task and shipped its report.
    fn on_task_report(&self, report: TaskReport);

    /// Periodic progress post from a worker.
    fn on_task_status(&self, status: TaskStatus);
}

pub struct HttpJobRunner {
    client: reqwest::Client,
    workers: Vec<String>,
    next_worker: AtomicUsize,
    pending: DashMap<String, oneshot::Sender<TaskReport>>,
    live: Mutex<JobMeta>,
    last_status: Mutex<Option<TaskStatus>>,
}

impl HttpJobRunner {
    pub fn new(workers: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            client: reqwest::Client::new(),
            workers,
            next_worker: AtomicUsize::new(0),
            pending: DashMap::new(),
            live: Mutex::new(JobMeta::default()),
            last_status: Mutex::new(None),
        })
    }

    fn pick_worker(&self) -> Result<&str> {
        if self.workers.is_empty() {
            return Err(anyhow::anyhow!("No workers configured"));
        }
        let i = self.next_worker.fetch_add(1, Ordering::Relaxed);
        Ok(&self.workers[i % self.workers.len()])
    }

    /// Posts the spec to a worker and waits for the matching report. The
    /// pending entry is registered before the POST so a report racing the
    /// admission response cannot be dropped.
    async fn dispatch(&self, spec: &TaskSpec) -> Result<TaskReport> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(spec.tid.clone(), tx);
        match self.submit_to_worker(spec).await {
            Ok(()) => {}
            Err(err) => {
                self.pending.remove(&spec.tid);
                return Err(err);
            }
        }
        let report = rx.await?;
        Ok(report)
    }

    async fn submit_to_worker(&self, spec: &TaskSpec) -> Result<()> {
        let worker = self.pick_worker()?;
        let url = format!("http://{}{}", worker, ENDPOINT_TASK_NEW);
        tracing::info!("Dispatch task {:?} kind {:?} to {}", spec.tid, spec.kind, worker);
        let resp = self.client.post(&url).json(spec).send().await?;
        let body: Resp<String> = resp.json().await?;
        if !body.err.is_empty() {
            return Err(anyhow::anyhow!("Worker rejected task: {}", body.err));
        }
        Ok(())
    }
}

#[async_trait]
impl JobRunner for HttpJobRunner {
    async fn run_job(
        &self,
        job: Arc<dyn Job>,
        env: &serde_json::Value,
    ) -> (JobMeta, Result<()>) {
        let spec = TaskSpec {
            tid: uuid::Uuid::new_v4().to_string(),
            kind: job.kind().to_string(),
            payload: job.task_payload(env),
        };
        let mut jmeta = JobMeta {
            kind: job.kind().to_string(),
            start_ts: now_ms(),
            ..Default::default()
        };
        *self.live.lock().unwrap() = jmeta.clone();

        let result = match self.dispatch(&spec).await {
            Ok(report) if report.err.is_empty() => Ok(()),
            Ok(report) => Err(anyhow::anyhow!("{}", report.err)),
            Err(err) => Err(err),
        };

        jmeta.end_ts = now_ms();
        if let Err(err) = &result {
            jmeta.err_msg = err.to_string();
        }
        *self.live.lock().unwrap() = JobMeta::default();
        (jmeta, result)
    }

    fn live_job_meta(&self) -> JobMeta {
        self.live.lock().unwrap().clone()
    }

    fn on_task_report(&self, report: TaskReport) {
        match self.pending.remove(&report.tid) {
            Some((_, tx)) => {
                let _ = tx.send(report);
            }
            None => tracing::warn!("Unmatched task report {:?}", report.tid),
        }
    }

    fn on_task_status(&self, status: TaskStatus) {
        tracing::debug!(
            "Task {:?} progress {}/{}",
            status.tid,
            status.done,
            status.total
        );
        *self.last_status.lock().unwrap() = Some(status);
    }
}
