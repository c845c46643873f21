use super::job::JobRunner;
use super::protocol::RunProjReceipt;
use crate::task::types::{now_ms, now_nanos};
use crate::task::{JobMeta, Project, ProjectMeta};

use anyhow::Result;
use std::sync::Arc;
use std::sync::Mutex;

/// Fields guarded by the driver mutex. `free` is the admission gate; the
/// meta is replaced on each admission, so no history survives a new run.
struct DriverState {
    free: bool,
    idx: u64,
    proj_id: String,
    config: String,
    proj: Option<Arc<dyn Project>>,
    meta: Option<ProjectMeta>,
}

/// The master's project driver. One per process, shared with the HTTP
/// handlers through an `Arc`.
pub struct ProjectDriver {
    state: Mutex<DriverState>,
    job_runner: Arc<dyn JobRunner>,
}

impl ProjectDriver {
    pub fn new(job_runner: Arc<dyn JobRunner>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DriverState {
                free: true,
                idx: 0,
                proj_id: String::new(),
                config: String::new(),
                proj: None,
                meta: None,
            }),
            job_runner,
        })
    }

    /// Admission entry point. A busy master rejects through the receipt;
    /// there is no queue. On success the driver runs asynchronously and
    /// the minted project id is returned immediately.
    pub fn run_proj(self: &Arc<Self>, proj: Arc<dyn Project>, config: String) -> RunProjReceipt {
        match self.check_and_unset_free(proj.clone(), config) {
            Ok(proj_id) => {
                let driver = self.clone();
                tokio::spawn(async move {
                    driver.proj_runner(proj).await;
                });
                RunProjReceipt {
                    proj_id,
                    err_msg: String::new(),
                }
            }
            Err(err) => RunProjReceipt {
                proj_id: String::new(),
                err_msg: err.to_string(),
            },
        }
    }

    fn check_and_unset_free(&self, proj: Arc<dyn Project>, config: String) -> Result<String> {
        let mut st = self.state.lock().unwrap();
        if !st.free {
            return Err(anyhow::anyhow!("Project {:?} in running", st.proj_id));
        }
        st.free = false;
        st.proj = Some(proj);
        st.config = config;
        st.proj_id = format!("proj{}-{}", now_nanos(), st.idx);
        st.idx += 1;
        Ok(st.proj_id.clone())
    }

    fn start(&self, proj: &Arc<dyn Project>) {
        let mut st = self.state.lock().unwrap();
        st.meta = Some(ProjectMeta {
            name: proj.name().to_string(),
            start_ts: now_ms(),
            ..Default::default()
        });
    }

    fn finish(&self, err: Option<String>) {
        let mut st = self.state.lock().unwrap();
        if let Some(meta) = st.meta.as_mut() {
            if let Some(msg) = err {
                meta.err_msg = msg;
            }
            meta.finished = true;
            meta.end_ts = now_ms();
        }
        st.free = true;
    }

    fn insert_job_meta(&self, jmeta: JobMeta) {
        let mut st = self.state.lock().unwrap();
        if let Some(meta) = st.meta.as_mut() {
            meta.job_metas.push(jmeta);
        }
    }

    /// The driver loop: project init, every job in declaration order, then
    /// project finish. The first error records into the meta, reopens the
    /// gate and skips everything after it; a failed job never reaches
    /// `Project::finish`.
    async fn proj_runner(self: Arc<Self>, proj: Arc<dyn Project>) {
        let (proj_id, config) = {
            let st = self.state.lock().unwrap();
            (st.proj_id.clone(), st.config.clone())
        };
        tracing::info!("Run project {:?}", proj_id);
        self.start(&proj);
        if let Err(err) = proj.init(&config) {
            tracing::error!("Fail on project {:?} init, {}", proj_id, err);
            self.finish(Some(err.to_string()));
            return;
        }
        for job in proj.jobs() {
            let env = proj.env();
            let (jmeta, result) = self.job_runner.run_job(job.clone(), &env).await;
            self.insert_job_meta(jmeta);
            if let Err(err) = result {
                let err = format!("Fail on job {:?}, {}", job.kind(), err);
                tracing::error!("{}", err);
                self.finish(Some(err));
                return;
            }
        }
        if let Err(err) = proj.finish() {
            tracing::error!("Fail on project {:?} finish, {}", proj_id, err);
            self.finish(Some(err.to_string()));
            return;
        }
        self.finish(None);
        tracing::info!("Run project {:?} finished", proj_id);
    }

    /// Deep-copy snapshot of the current project meta; a zero-value meta
    /// before any project has ever run.
    pub fn snapshot_meta(&self) -> ProjectMeta {
        let st = self.state.lock().unwrap();
        st.meta.clone().unwrap_or_default()
    }

    /// Snapshot augmented with the in-flight job: when the job runner
    /// reports a live job meta not yet committed as the snapshot's tail,
    /// it is appended so clients see the job before it completes. The tail
    /// match is by kind or start timestamp, so two back-to-back jobs of
    /// the same kind share one entry until the first one commits.
    pub fn query_proj_status(&self) -> ProjectMeta {
        let mut pmeta = self.snapshot_meta();
        let jmeta = self.job_runner.live_job_meta();
        if jmeta.kind.is_empty() {
            return pmeta;
        }
        match pmeta.job_metas.last() {
            Some(last) if last.kind == jmeta.kind || last.start_ts == jmeta.start_ts => {}
            _ => pmeta.job_metas.push(jmeta),
        }
        pmeta
    }
}
