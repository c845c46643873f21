use serde::{Deserialize, Serialize};

/// Milliseconds since the unix epoch. All wire timestamps use this scale;
/// zero means "not set".
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Nanoseconds since the unix epoch, used only to mint project ids.
pub fn now_nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Response envelope every HTTP endpoint replies with. `err` is empty on
/// success; `data` is absent when the request was rejected outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resp<T> {
    pub err: String,
    pub data: Option<T>,
}

impl<T> Resp<T> {
    pub fn ok(data: T) -> Self {
        Self {
            err: String::new(),
            data: Some(data),
        }
    }

    pub fn error(err: impl ToString) -> Self {
        Self {
            err: err.to_string(),
            data: None,
        }
    }
}

/// What the master posts to a worker to start a task. The registry
/// interprets `kind`; `payload` carries the kind-specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub tid: String,
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Point-in-time progress of the task a worker is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub tid: String,
    pub desc: String,
    pub start_ts: u64,
    pub finished: bool,
    pub total: usize,
    pub done: usize,
}

/// Final outcome of a task, shipped from worker to master once the
/// executor pool has retired. `err` is empty on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub err: String,
    pub tid: String,
    pub kind: String,
    pub start_ts: u64,
    pub end_ts: u64,
    pub status: Option<TaskStatus>,
    pub output: serde_json::Value,
}

/// Per-job record accumulated by the master while driving a project.
/// An empty `kind` is the idle sentinel for the live (uncommitted) job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    pub kind: String,
    pub start_ts: u64,
    pub end_ts: u64,
    pub err_msg: String,
}

/// Cumulative status of the current (or most recent) project run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: String,
    pub start_ts: u64,
    pub end_ts: u64,
    pub err_msg: String,
    pub finished: bool,
    pub job_metas: Vec<JobMeta>,
}
