//! Task Abstraction Module
//!
//! The polymorphic surface shared by the master and worker roles, plus the
//! wire types they exchange.
//!
//! ## Submodules
//! - **`traits`**: The pluggable capability boundary. A project is an
//!   ordered sequence of jobs; a job is dispatched to a worker as one task;
//!   a task decomposes into tasklets, the smallest retry/parallelism unit.
//! - **`types`**: Serde types crossing the HTTP boundary (`TaskSpec`,
//!   `TaskReport`, `ProjectMeta`, ...) and the response envelope.
//! - **`registry`**: Maps a project name to its implementation and a task
//!   kind to its generator, so both processes stay generic over the
//!   concrete work.

pub mod registry;
pub mod traits;
pub mod types;

#[cfg(test)]
mod tests;

pub use registry::{TaskGenerator, TaskRegistry};
pub use traits::{Job, Project, Task, Tasklet, TaskletCtx};
pub use types::{now_ms, now_nanos, JobMeta, ProjectMeta, Resp, TaskReport, TaskSpec, TaskStatus};
