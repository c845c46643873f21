use super::report::ReportSink;
use crate::task::{Task, TaskRegistry, Tasklet, TaskletCtx, TaskReport, TaskSpec, TaskStatus};
use crate::task::types::now_ms;

use anyhow::Result;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

/// Capacity of the todo channel between the producer and the executors.
pub const BUF_TASKLET_CNT: usize = 8;
/// Number of concurrent tasklet executors per task.
pub const RUNNING_EXECUTOR_CNT: usize = 2;
/// Attempts per tasklet; only the final attempt's outcome matters.
pub const TASKLET_MAX_RETRY: usize = 3;

/// Fields guarded by the engine mutex. `free` is the admission gate:
/// test-and-set happens in the same critical section as the state write.
struct EngineState {
    free: bool,
    task: Option<Arc<dyn Task>>,
    total: usize,
    done: usize,
    started_at: u64,
    ended_at: u64,
    finished: bool,
    err: Option<String>,
}

/// The worker's task engine. One per process, shared with the HTTP
/// handlers and the status reporter through an `Arc`.
pub struct TaskEngine {
    state: Mutex<EngineState>,
    sink: Arc<dyn ReportSink>,
}

impl TaskEngine {
    pub fn new(sink: Arc<dyn ReportSink>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EngineState {
                free: true,
                task: None,
                total: 0,
                done: 0,
                started_at: 0,
                ended_at: 0,
                finished: false,
                err: None,
            }),
            sink,
        })
    }

    /// Admission entry point: spawn the task from its spec, take the gate,
    /// launch the handler. Returns before the task has done any work;
    /// completion is reported asynchronously.
    pub fn task_recipient(self: &Arc<Self>, registry: &TaskRegistry, spec: &TaskSpec) -> Result<()> {
        let task = registry.spawn_task(spec)?;
        self.check_and_unset_free(task.clone())?;
        let engine = self.clone();
        tokio::spawn(async move {
            engine.handle_task_req(task).await;
        });
        Ok(())
    }

    pub fn check_and_unset_free(&self, task: Arc<dyn Task>) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        if !st.free {
            let kind = st.task.as_ref().map(|t| t.kind()).unwrap_or_default();
            return Err(anyhow::anyhow!("Worker busy with task {:?}", kind));
        }
        st.free = false;
        st.task = Some(task);
        Ok(())
    }

    fn set_free(&self) {
        tracing::info!("Set worker free");
        let mut st = self.state.lock().unwrap();
        st.free = true;
        st.task = None;
    }

    fn kickoff(&self) {
        let mut st = self.state.lock().unwrap();
        st.started_at = now_ms();
        st.err = None;
        st.total = 0;
        st.done = 0;
        st.finished = false;
        st.ended_at = 0;
    }

    fn finish(&self) {
        let mut st = self.state.lock().unwrap();
        st.finished = true;
        st.ended_at = now_ms();
    }

    fn aborted(&self) -> bool {
        self.state.lock().unwrap().err.is_some()
    }

    fn abort_err(&self) -> Option<String> {
        self.state.lock().unwrap().err.clone()
    }

    fn set_err(&self, err: &str) {
        let mut st = self.state.lock().unwrap();
        st.err = Some(err.to_string());
    }

    fn tasklet_done(&self) {
        let mut st = self.state.lock().unwrap();
        st.done += 1;
    }

    /// Live progress of the running task; `None` while the engine is free.
    pub fn task_status(&self) -> Option<TaskStatus> {
        let st = self.state.lock().unwrap();
        if st.free {
            return None;
        }
        let task = st.task.as_ref()?;
        Some(TaskStatus {
            tid: task.task_id(),
            desc: task.desc(),
            start_ts: st.started_at,
            finished: st.finished,
            total: st.total,
            done: st.done,
        })
    }

    /// Drives an admitted task through its whole lifecycle and ships the
    /// report. The caller must have taken the gate via
    /// `check_and_unset_free` first.
    pub async fn handle_task_req(self: Arc<Self>, task: Arc<dyn Task>) {
        tracing::info!("Dealing with task {:?}", task.task_id());
        self.kickoff();
        match task.init(RUNNING_EXECUTOR_CNT) {
            Ok(()) => self.run_tasklets(&task).await,
            Err(err) => {
                tracing::error!("Fail to init task {:?}, {}", task.task_id(), err);
                self.set_err(&err.to_string());
            }
        }
        if let Some(err) = self.abort_err() {
            task.set_error(err);
        }
        self.finish();
        let report = self.generate_report(&task);
        self.set_free();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            sink.deliver_report(report).await;
        });
    }

    /// Channel setup, executor pool, producer, completion barrier,
    /// ctx release and reduction, in that order.
    async fn run_tasklets(self: &Arc<Self>, task: &Arc<dyn Task>) {
        let total = task.tasklet_cnt();
        tracing::info!("Task {:?} tasklet count {}", task.task_id(), total);
        {
            let mut st = self.state.lock().unwrap();
            st.err = None;
            st.total = total;
        }

        let (todo_tx, todo_rx) = mpsc::channel::<Box<dyn Tasklet>>(BUF_TASKLET_CNT);
        // Sized to the declared tasklet count so completion sends can
        // never block; an aborting executor must not get stuck here.
        let (done_tx, mut done_rx) = mpsc::channel::<Box<dyn Tasklet>>(total.max(1));
        let (abort_tx, mut abort_rx) = watch::channel(false);
        let abort_tx = Arc::new(abort_tx);
        let todo_rx = Arc::new(tokio::sync::Mutex::new(todo_rx));

        let mut ctx_list: Vec<Arc<dyn TaskletCtx>> = Vec::new();
        let mut joins = Vec::with_capacity(RUNNING_EXECUTOR_CNT);
        for eid in 0..RUNNING_EXECUTOR_CNT {
            let tctx = task.new_tasklet_ctx();
            if let Some(ctx) = &tctx {
                ctx_list.push(ctx.clone());
            }
            let engine = self.clone();
            let rx = todo_rx.clone();
            let dtx = done_tx.clone();
            let atx = abort_tx.clone();
            joins.push(tokio::spawn(async move {
                engine.tasklet_executor(eid, rx, dtx, atx, tctx).await;
            }));
        }
        drop(done_tx);

        self.assign_tasklets(task, todo_tx, &mut abort_rx).await;

        tracing::info!("Wait for task {:?} done", task.task_id());
        for join in joins {
            let _ = join.await;
        }

        tracing::info!("Release all executors' ctx");
        for ctx in ctx_list {
            ctx.close();
        }

        if !self.aborted() {
            self.reduce_tasklets(task, &mut done_rx).await;
        }
    }

    /// Producer: pulls tasklets out of the generator and feeds the todo
    /// channel. Terminates on generator exhaustion (dropping the sender
    /// closes the channel) or on abort, including while blocked on a full
    /// buffer.
    async fn assign_tasklets(
        &self,
        task: &Arc<dyn Task>,
        todo_tx: mpsc::Sender<Box<dyn Tasklet>>,
        abort_rx: &mut watch::Receiver<bool>,
    ) {
        tracing::info!("Assign tasklets");
        let task_id = task.task_id();
        let mut i = 0usize;
        loop {
            if self.aborted() {
                tracing::info!("Abort assign tasklets");
                break;
            }
            let tasklet_id = format!("{}-{}", task_id, i);
            let Some(tasklet) = task.next_tasklet(&tasklet_id) else {
                break;
            };
            tracing::debug!("Put tasklet {:?} to todo list", tasklet.tasklet_id());
            tokio::select! {
                res = todo_tx.send(tasklet) => {
                    if res.is_err() {
                        break;
                    }
                }
                _ = abort_rx.changed() => {
                    tracing::info!("Abort assign tasklets");
                    break;
                }
            }
            i += 1;
        }
        tracing::info!("Assign tasklets finished");
    }

    /// One executor of the pool. Stops taking new tasklets once abort is
    /// observed or the todo channel is drained; an in-flight attempt is
    /// never interrupted.
    async fn tasklet_executor(
        &self,
        eid: usize,
        todo_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Box<dyn Tasklet>>>>,
        done_tx: mpsc::Sender<Box<dyn Tasklet>>,
        abort_tx: Arc<watch::Sender<bool>>,
        tctx: Option<Arc<dyn TaskletCtx>>,
    ) {
        loop {
            if self.aborted() {
                tracing::info!("Error set in task state, abort executor #{}", eid);
                break;
            }
            tracing::debug!("Executor #{}, retrieve todo tasklet...", eid);
            let tasklet = { todo_rx.lock().await.recv().await };
            let Some(tasklet) = tasklet else {
                tracing::info!("Todo tasklets drained, exit executor #{}", eid);
                break;
            };
            let tasklet_id = tasklet.tasklet_id();
            tracing::debug!("Executor #{} execute tasklet {:?}", eid, tasklet_id);
            let mut result = Ok(());
            for _ in 0..TASKLET_MAX_RETRY {
                result = tasklet.execute(tctx.as_deref()).await;
                if result.is_ok() {
                    break;
                }
                tracing::info!("Retry execute tasklet {:?}", tasklet_id);
            }
            if let Err(err) = result {
                tracing::warn!("Fail on tasklet {:?}, err {}", tasklet_id, err);
                self.set_err(&err.to_string());
                let _ = abort_tx.send(true);
                break;
            }
            if done_tx.send(tasklet).await.is_ok() {
                self.tasklet_done();
            }
        }
        tracing::debug!("Executor #{}, exit", eid);
    }

    /// Drains the done channel in completion order and hands the sequence
    /// to the task. Only reached on non-aborted runs, after every executor
    /// has exited and dropped its sender.
    async fn reduce_tasklets(
        &self,
        task: &Arc<dyn Task>,
        done_rx: &mut mpsc::Receiver<Box<dyn Tasklet>>,
    ) {
        tracing::info!("Reduce tasklets for task {:?}", task.task_id());
        let mut tasklets = Vec::new();
        while let Some(tasklet) = done_rx.recv().await {
            tasklets.push(tasklet);
        }
        task.reduce_tasklets(tasklets);
    }

    fn generate_report(&self, task: &Arc<dyn Task>) -> TaskReport {
        let status = self.task_status();
        let st = self.state.lock().unwrap();
        TaskReport {
            err: task.error().unwrap_or_default(),
            tid: task.task_id(),
            kind: task.kind(),
            start_ts: st.started_at,
            end_ts: st.ended_at,
            status,
            output: task.output(),
        }
    }
}
