use super::engine::TaskEngine;
use crate::task::{Resp, TaskRegistry, TaskSpec};

use axum::{Extension, Json};
use std::sync::Arc;

/// Task recipient. Spawns the task from its spec and admits it; a busy
/// worker or an unknown kind rejects through the envelope. Success means
/// "accepted", not "completed".
pub async fn handle_task_new(
    Extension(engine): Extension<Arc<TaskEngine>>,
    Extension(registry): Extension<Arc<TaskRegistry>>,
    Json(spec): Json<TaskSpec>,
) -> Json<Resp<String>> {
    tracing::info!("Get task spec {:?} kind {:?}", spec.tid, spec.kind);
    match engine.task_recipient(&registry, &spec) {
        Ok(()) => Json(Resp::ok(String::new())),
        Err(err) => {
            tracing::info!("Can't receive task {:?}, {}", spec.tid, err);
            Json(Resp::error(err))
        }
    }
}
