//! Abstraction Layer Tests
//!
//! ## Test Scopes
//! - **Registry**: Project and task-kind registration, lookup, and the
//!   spawn path including unknown-kind rejection.
//! - **Wire types**: Envelope shape and spec payload defaults.

#[cfg(test)]
mod tests {
    use crate::task::registry::TaskRegistry;
    use crate::task::traits::{Job, Project, Task, Tasklet, TaskletCtx};
    use crate::task::types::{Resp, TaskSpec};

    use anyhow::Result;
    use std::sync::Arc;

    struct NoopProject;

    impl Project for NoopProject {
        fn name(&self) -> &str {
            "noop"
        }

        fn init(&self, _config: &str) -> Result<()> {
            Ok(())
        }

        fn jobs(&self) -> Vec<Arc<dyn Job>> {
            vec![]
        }

        fn env(&self) -> serde_json::Value {
            serde_json::Value::Null
        }

        fn finish(&self) -> Result<()> {
            Ok(())
        }
    }

    struct NoopTask {
        tid: String,
    }

    impl Task for NoopTask {
        fn task_id(&self) -> String {
            self.tid.clone()
        }

        fn kind(&self) -> String {
            "noop".to_string()
        }

        fn desc(&self) -> String {
            "does nothing".to_string()
        }

        fn init(&self, _executor_cnt: usize) -> Result<()> {
            Ok(())
        }

        fn tasklet_cnt(&self) -> usize {
            0
        }

        fn new_tasklet_ctx(&self) -> Option<Arc<dyn TaskletCtx>> {
            None
        }

        fn next_tasklet(&self, _tasklet_id: &str) -> Option<Box<dyn Tasklet>> {
            None
        }

        fn reduce_tasklets(&self, _done: Vec<Box<dyn Tasklet>>) {}

        fn output(&self) -> serde_json::Value {
            serde_json::Value::Null
        }

        fn error(&self) -> Option<String> {
            None
        }

        fn set_error(&self, _err: String) {}
    }

    fn noop_spec(kind: &str) -> TaskSpec {
        TaskSpec {
            tid: "t42".to_string(),
            kind: kind.to_string(),
            payload: serde_json::Value::Null,
        }
    }

    // ============================================================
    // TEST 1: Registry
    // ============================================================

    #[test]
    fn test_register_and_spawn_task() {
        let registry = TaskRegistry::new();
        registry.register_task_kind("noop", |spec| {
            Ok(Arc::new(NoopTask {
                tid: spec.tid.clone(),
            }))
        });

        assert!(registry.has_kind("noop"));
        assert_eq!(registry.list_kinds(), vec!["noop"]);

        let task = registry.spawn_task(&noop_spec("noop")).unwrap();
        assert_eq!(task.task_id(), "t42");
        assert_eq!(task.kind(), "noop");
    }

    #[test]
    fn test_spawn_unknown_kind_returns_error() {
        let registry = TaskRegistry::new();
        let err = registry.spawn_task(&noop_spec("missing")).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_generator_failure_propagates() {
        let registry = TaskRegistry::new();
        registry.register_task_kind("broken", |_spec| Err(anyhow::anyhow!("bad payload")));

        let err = registry.spawn_task(&noop_spec("broken")).unwrap_err();
        assert!(err.to_string().contains("bad payload"));
    }

    #[test]
    fn test_register_and_get_project() {
        let registry = TaskRegistry::new();
        registry.register_project(Arc::new(NoopProject));

        assert!(registry.get_project("noop").is_some());
        assert!(registry.get_project("other").is_none());
        assert_eq!(registry.list_projects(), vec!["noop"]);
    }

    // ============================================================
    // TEST 2: Wire types
    // ============================================================

    #[test]
    fn test_resp_envelope_shape() {
        let ok = serde_json::to_value(Resp::ok(7u32)).unwrap();
        assert_eq!(ok["err"], "");
        assert_eq!(ok["data"], 7);

        let rejected = serde_json::to_value(Resp::<u32>::error("busy")).unwrap();
        assert_eq!(rejected["err"], "busy");
        assert!(rejected["data"].is_null());
    }

    #[test]
    fn test_task_spec_payload_defaults_to_null() {
        let spec: TaskSpec = serde_json::from_str(r#"{"tid":"t1","kind":"wordcount"}"#).unwrap();
        assert_eq!(spec.tid, "t1");
        assert!(spec.payload.is_null());
    }
}
