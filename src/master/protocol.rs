//! HTTP contract of the master surface: project submission and status
//! polling for clients, report and status intake for workers. Every
//! response uses the standard envelope.

use serde::{Deserialize, Serialize};

// Endpoints
pub const ENDPOINT_PROJ_RUN: &str = "/proj/run";
pub const ENDPOINT_PROJ_STATUS: &str = "/proj/status";
pub const ENDPOINT_TASK_REPORT: &str = "/task/report";
pub const ENDPOINT_TASK_STATUS: &str = "/task/status";

/// Query parameters of the run-project request; the body carries the
/// opaque project config as raw bytes.
#[derive(Debug, Deserialize)]
pub struct RunProjParams {
    pub name: String,
}

/// Admission result. `err_msg` is set when the submission was rejected;
/// `proj_id` is empty in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProjReceipt {
    pub proj_id: String,
    pub err_msg: String,
}
