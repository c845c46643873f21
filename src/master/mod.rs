//! Master Project Driver Module
//!
//! The master admits at most one project at a time and drives its jobs
//! strictly in order. Each job is handed to the job runner, which turns it
//! into a task, picks a worker and waits for the worker's report. Per-job
//! metadata accumulates into the project meta, which clients poll live.
//!
//! ## Submodules
//! - **`project`**: Admission gate, the sequential driver loop, meta
//!   snapshots and live-status augmentation.
//! - **`job`**: The job runner seam: dispatching one job as one task to
//!   a worker over HTTP and matching the asynchronous report back to the
//!   waiting dispatch.
//! - **`handlers`**: The master's four HTTP endpoints.
//! - **`protocol`**: HTTP contract of the master surface.

pub mod handlers;
pub mod job;
pub mod project;
pub mod protocol;


pub use job::{HttpJobRunner, JobRunner};
pub use project::ProjectDriver;
