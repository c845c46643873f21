//! Pegasus Batch Runner Library
//!
//! This library crate defines the core modules of the batch job runner.
//! It serves as the foundation for the binary executable (`main.rs`), which
//! starts either a master or a worker process.
//!
//! ## Architecture Modules
//! The system is composed of four subsystems:
//!
//! - **`task`**: The abstraction layer shared by both roles. Defines the
//!   polymorphic surface (`Project`, `Job`, `Task`, `Tasklet`), the wire
//!   types exchanged over HTTP, and the registry mapping project names and
//!   task kinds to pluggable implementations.
//! - **`master`**: The project driver. Admits at most one project at a
//!   time, executes its jobs strictly in order by dispatching each as a
//!   task to a worker, and exposes live status to polling clients.
//! - **`worker`**: The task engine. Admits at most one task at a time,
//!   fans it out into tasklets executed by a bounded pool with per-tasklet
//!   retry and cooperative abort, reduces the results and reports back.
//! - **`builtin`**: Built-in task kinds usable without external plugins.

pub mod builtin;
pub mod master;
pub mod task;
pub mod worker;
