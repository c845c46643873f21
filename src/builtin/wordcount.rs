//! Word count, the built-in demo kind. The project carries a list of text
//! inputs in its config; its single job fans out one tasklet per input on
//! the worker, and the reduction merges the per-input counts into one
//! sorted frequency table.

use crate::task::{Job, Project, Task, Tasklet, TaskletCtx, TaskSpec};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const WORDCOUNT_KIND: &str = "wordcount";

#[derive(Deserialize)]
struct WordCountConfig {
    inputs: Vec<String>,
}

#[derive(Deserialize)]
struct WordCountPayload {
    inputs: Vec<String>,
}

/// Lowercased alphanumeric-and-underscore tokens of a text.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let cleaned: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
                .to_lowercase();
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        })
        .collect()
}

pub struct WordCountProject {
    inputs: Mutex<Vec<String>>,
}

impl WordCountProject {
    pub fn new() -> Self {
        Self {
            inputs: Mutex::new(Vec::new()),
        }
    }
}

impl Project for WordCountProject {
    fn name(&self) -> &str {
        WORDCOUNT_KIND
    }

    fn init(&self, config: &str) -> Result<()> {
        let cfg: WordCountConfig = serde_json::from_str(config)?;
        *self.inputs.lock().unwrap() = cfg.inputs;
        Ok(())
    }

    fn jobs(&self) -> Vec<Arc<dyn Job>> {
        vec![Arc::new(WordCountJob {
            inputs: self.inputs.lock().unwrap().clone(),
        })]
    }

    fn env(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

struct WordCountJob {
    inputs: Vec<String>,
}

impl Job for WordCountJob {
    fn kind(&self) -> &str {
        WORDCOUNT_KIND
    }

    fn task_payload(&self, _env: &serde_json::Value) -> serde_json::Value {
        serde_json::json!({ "inputs": self.inputs })
    }
}

pub struct WordCountTask {
    tid: String,
    inputs: Vec<String>,
    cursor: AtomicUsize,
    // tasklet id -> that input's counts; reduction merges only the
    // entries of tasklets that actually completed
    partials: Arc<DashMap<String, HashMap<String, u64>>>,
    output: Mutex<serde_json::Value>,
    err: Mutex<Option<String>>,
}

impl WordCountTask {
    pub fn from_spec(spec: &TaskSpec) -> Result<Arc<dyn Task>> {
        let payload: WordCountPayload = serde_json::from_value(spec.payload.clone())?;
        Ok(Arc::new(Self {
            tid: spec.tid.clone(),
            inputs: payload.inputs,
            cursor: AtomicUsize::new(0),
            partials: Arc::new(DashMap::new()),
            output: Mutex::new(serde_json::Value::Null),
            err: Mutex::new(None),
        }))
    }
}

impl Task for WordCountTask {
    fn task_id(&self) -> String {
        self.tid.clone()
    }

    fn kind(&self) -> String {
        WORDCOUNT_KIND.to_string()
    }

    fn desc(&self) -> String {
        format!("word count over {} inputs", self.inputs.len())
    }

    fn init(&self, _executor_cnt: usize) -> Result<()> {
        Ok(())
    }

    fn tasklet_cnt(&self) -> usize {
        self.inputs.len()
    }

    fn new_tasklet_ctx(&self) -> Option<Arc<dyn TaskletCtx>> {
        None
    }

    fn next_tasklet(&self, tasklet_id: &str) -> Option<Box<dyn Tasklet>> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.inputs.get(i).map(|text| {
            Box::new(WordCountTasklet {
                id: tasklet_id.to_string(),
                text: text.clone(),
                partials: self.partials.clone(),
            }) as Box<dyn Tasklet>
        })
    }

    fn reduce_tasklets(&self, done: Vec<Box<dyn Tasklet>>) {
        let mut merged: BTreeMap<String, u64> = BTreeMap::new();
        for tasklet in &done {
            if let Some(counts) = self.partials.get(&tasklet.tasklet_id()) {
                for (word, count) in counts.iter() {
                    *merged.entry(word.clone()).or_insert(0) += count;
                }
            }
        }
        *self.output.lock().unwrap() = serde_json::json!(merged);
    }

    fn output(&self) -> serde_json::Value {
        self.output.lock().unwrap().clone()
    }

    fn error(&self) -> Option<String> {
        self.err.lock().unwrap().clone()
    }

    fn set_error(&self, err: String) {
        *self.err.lock().unwrap() = Some(err);
    }
}

struct WordCountTasklet {
    id: String,
    text: String,
    partials: Arc<DashMap<String, HashMap<String, u64>>>,
}

#[async_trait]
impl Tasklet for WordCountTasklet {
    fn tasklet_id(&self) -> String {
        self.id.clone()
    }

    async fn execute(&self, _ctx: Option<&dyn TaskletCtx>) -> Result<()> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for token in tokenize(&self.text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        self.partials.insert(self.id.clone(), counts);
        Ok(())
    }
}
