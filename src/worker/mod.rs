//! Worker Task Engine Module
//!
//! A worker runs at most one task at a time. The engine fans the admitted
//! task out into tasklets executed by a small fixed pool, retries each
//! tasklet a bounded number of times, aborts the whole task cooperatively
//! on the first terminal failure, reduces the completed tasklets into the
//! task output and ships a report back to the master.
//!
//! ## Lifecycle
//! 1. **Admission**: the HTTP handler spawns the task from its spec via
//!    the registry, then takes the `free` gate; a busy worker rejects.
//! 2. **Execution**: a producer feeds tasklets into a bounded channel;
//!    executors drain it concurrently; the first terminal tasklet failure
//!    poisons the run and every participant winds down cooperatively.
//! 3. **Report**: success reduces the completed tasklets; failure records
//!    the error; either way a `TaskReport` is posted to the master
//!    asynchronously and the gate reopens.
//!
//! ## Submodules
//! - **`engine`**: Admission gate, executor pool, producer, retry and
//!   abort discipline, reduction.
//! - **`report`**: Report/status delivery back to the master.
//! - **`handlers`**: The task-recipient HTTP endpoint.
//! - **`protocol`**: HTTP contract of the worker surface.

pub mod engine;
pub mod handlers;
pub mod protocol;
pub mod report;


pub use engine::{TaskEngine, BUF_TASKLET_CNT, RUNNING_EXECUTOR_CNT, TASKLET_MAX_RETRY};
pub use report::{HttpReportSink, ReportSink};
