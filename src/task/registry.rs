use super::traits::{Project, Task};
use super::types::TaskSpec;

use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;

pub type TaskGenerator = Arc<dyn Fn(&TaskSpec) -> Result<Arc<dyn Task>> + Send + Sync>;

/// Maps project names and task kinds to their pluggable implementations.
/// The master resolves submissions through the project table; the worker
/// resolves incoming task specs through the generator table.
pub struct TaskRegistry {
    projects: DashMap<String, Arc<dyn Project>>,
    generators: DashMap<String, TaskGenerator>,
}

impl TaskRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            projects: DashMap::new(),
            generators: DashMap::new(),
        })
    }

    pub fn register_project(&self, proj: Arc<dyn Project>) {
        tracing::info!("Registered project: {}", proj.name());
        self.projects.insert(proj.name().to_string(), proj);
    }

    pub fn get_project(&self, name: &str) -> Option<Arc<dyn Project>> {
        self.projects.get(name).map(|entry| entry.value().clone())
    }

    pub fn register_task_kind<F>(&self, kind: &str, generator: F)
    where
        F: Fn(&TaskSpec) -> Result<Arc<dyn Task>> + Send + Sync + 'static,
    {
        self.generators.insert(kind.to_string(), Arc::new(generator));

        tracing::info!("Registered task kind: {}", kind);
    }

    /// Resolves the spec's kind and invokes its generator.
    pub fn spawn_task(&self, spec: &TaskSpec) -> Result<Arc<dyn Task>> {
        let Some(generator) = self.generators.get(&spec.kind) else {
            return Err(anyhow::anyhow!("Task {:?} not supported", spec.kind));
        };
        let task = generator.value()(spec)?;
        tracing::info!("Spawn task {:?} done", task.task_id());
        Ok(task)
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.generators.contains_key(kind)
    }

    pub fn list_kinds(&self) -> Vec<String> {
        self.generators
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn list_projects(&self) -> Vec<String> {
        self.projects
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}
