use super::job::JobRunner;
use super::project::ProjectDriver;
use super::protocol::{RunProjParams, RunProjReceipt};
use crate::task::{ProjectMeta, Resp, TaskRegistry, TaskReport, TaskStatus};

use axum::extract::Query;
use axum::{Extension, Json};
use std::sync::Arc;

/// Client API: submits a named project. The registry resolves the name;
/// admission happens inside the driver and its result travels in the
/// receipt, so a busy master still answers 200 with a filled `err_msg`.
pub async fn handle_run_proj(
    Extension(driver): Extension<Arc<ProjectDriver>>,
    Extension(registry): Extension<Arc<TaskRegistry>>,
    Query(params): Query<RunProjParams>,
    config: String,
) -> Json<Resp<RunProjReceipt>> {
    let Some(proj) = registry.get_project(&params.name) else {
        let err = format!("Proj {:?} not supported", params.name);
        tracing::info!("{}", err);
        return Json(Resp::error(err));
    };
    let receipt = driver.run_proj(proj, config);
    Json(Resp::ok(receipt))
}

/// Client API: live snapshot of the current project meta, augmented with
/// the in-flight job when one is running.
pub async fn handle_query_proj_status(
    Extension(driver): Extension<Arc<ProjectDriver>>,
) -> Json<Resp<ProjectMeta>> {
    Json(Resp::ok(driver.query_proj_status()))
}

/// Worker callback: final report of a dispatched task.
pub async fn handle_task_report(
    Extension(runner): Extension<Arc<dyn JobRunner>>,
    Json(report): Json<TaskReport>,
) -> Json<Resp<String>> {
    tracing::info!("Got task report for {:?}", report.tid);
    runner.on_task_report(report);
    Json(Resp::ok(String::new()))
}

/// Worker callback: periodic progress of the running task.
pub async fn handle_task_status(
    Extension(runner): Extension<Arc<dyn JobRunner>>,
    Json(status): Json<TaskStatus>,
) -> Json<Resp<String>> {
    runner.on_task_status(status);
    Json(Resp::ok(String::new()))
}
