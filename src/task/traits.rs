//! The pluggable capability boundary. Implementations of these traits are
//! looked up through the [`TaskRegistry`](super::registry::TaskRegistry);
//! the master and worker cores never know concrete kinds.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A named, ordered sequence of jobs submitted to the master as a unit.
///
/// `init` receives the opaque config string from the submission body and
/// is called once per run, before the first job; `finish` runs after the
/// last job on the success path only.
pub trait Project: Send + Sync {
    fn name(&self) -> &str;

    fn init(&self, config: &str) -> Result<()>;

    /// Jobs in execution order. Called once per run, after `init`.
    fn jobs(&self) -> Vec<Arc<dyn Job>>;

    /// Environment handed to every job dispatch of this run.
    fn env(&self) -> serde_json::Value;

    fn finish(&self) -> Result<()>;
}

/// One unit of work in a project, dispatched to a single worker as a task.
pub trait Job: Send + Sync {
    fn kind(&self) -> &str;

    /// Kind-specific payload of the task spec this job turns into.
    fn task_payload(&self, env: &serde_json::Value) -> serde_json::Value;
}

/// One unit of work executed on a worker; decomposes into tasklets.
///
/// The engine drives a task through `init` → `next_tasklet` (until `None`)
/// → `reduce_tasklets` (success) or `set_error` (abort), then reads
/// `output`/`error` for the report. Implementations carry their own
/// interior mutability; the engine only ever holds `Arc<dyn Task>`.
pub trait Task: Send + Sync {
    fn task_id(&self) -> String;

    fn kind(&self) -> String;

    fn desc(&self) -> String;

    fn init(&self, executor_cnt: usize) -> Result<()>;

    /// Tasklet count declared up front. The generator may still end
    /// early; `next_tasklet` returning `None` is the real terminator.
    fn tasklet_cnt(&self) -> usize;

    /// Fresh per-executor scratch, or `None` when the kind needs none.
    fn new_tasklet_ctx(&self) -> Option<Arc<dyn TaskletCtx>>;

    /// Generator. `tasklet_id` is `"{task_id}-{i}"` for i = 0, 1, ...
    fn next_tasklet(&self, tasklet_id: &str) -> Option<Box<dyn Tasklet>>;

    /// Consumes the completed tasklets, in completion order (any
    /// permutation of submission order). Never called on an aborted run.
    fn reduce_tasklets(&self, done: Vec<Box<dyn Tasklet>>);

    fn output(&self) -> serde_json::Value;

    fn error(&self) -> Option<String>;

    fn set_error(&self, err: String);
}

impl std::fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("task_id", &self.task_id())
            .field("kind", &self.kind())
            .finish()
    }
}

/// The smallest retry/parallelism unit. `execute` must be idempotent:
/// a failing attempt is retried with the same tasklet instance.
#[async_trait]
pub trait Tasklet: Send + Sync {
    fn tasklet_id(&self) -> String;

    async fn execute(&self, ctx: Option<&dyn TaskletCtx>) -> Result<()>;
}

/// Per-executor resource holder. Closed exactly once, after every
/// executor of the pool has exited.
pub trait TaskletCtx: Send + Sync {
    fn close(&self);
}
