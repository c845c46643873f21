//! Built-in task kinds. These keep a freshly deployed cluster usable
//! without external plugins and double as reference implementations of
//! the polymorphic surface.

pub mod wordcount;

#[cfg(test)]
mod tests;

use crate::task::TaskRegistry;

/// Registers every built-in kind. Called by both roles at startup so a
/// master can submit what a worker can run.
pub fn register(registry: &TaskRegistry) {
    registry.register_project(std::sync::Arc::new(wordcount::WordCountProject::new()));
    registry.register_task_kind(wordcount::WORDCOUNT_KIND, wordcount::WordCountTask::from_spec);
}
