//! Built-in Kind Tests
//!
//! Drives the word-count implementation through the same trait surface
//! the engine uses: generate, execute, reduce, read the output.

#[cfg(test)]
mod tests {
    use crate::builtin::wordcount::{WordCountProject, WordCountTask, WORDCOUNT_KIND};
    use crate::task::{Job, Project, Task, TaskSpec, Tasklet};

    fn spec_for(inputs: &[&str]) -> TaskSpec {
        TaskSpec {
            tid: "wc1".to_string(),
            kind: WORDCOUNT_KIND.to_string(),
            payload: serde_json::json!({ "inputs": inputs }),
        }
    }

    #[tokio::test]
    async fn test_wordcount_counts_across_inputs() {
        let task = WordCountTask::from_spec(&spec_for(&[
            "the quick brown fox",
            "The lazy dog and the fox",
        ]))
        .unwrap();
        assert_eq!(task.tasklet_cnt(), 2);

        let mut done: Vec<Box<dyn Tasklet>> = Vec::new();
        let mut i = 0;
        while let Some(tasklet) = task.next_tasklet(&format!("wc1-{}", i)) {
            tasklet.execute(None).await.unwrap();
            done.push(tasklet);
            i += 1;
        }
        assert_eq!(done.len(), 2);

        task.reduce_tasklets(done);
        let output = task.output();
        assert_eq!(output["the"], 3);
        assert_eq!(output["fox"], 2);
        assert_eq!(output["dog"], 1);
    }

    #[tokio::test]
    async fn test_wordcount_cleans_tokens() {
        let task = WordCountTask::from_spec(&spec_for(&["Hello, hello! WORLD_1 ---"])).unwrap();

        let tasklet = task.next_tasklet("wc1-0").unwrap();
        tasklet.execute(None).await.unwrap();
        task.reduce_tasklets(vec![tasklet]);

        let output = task.output();
        assert_eq!(output["hello"], 2);
        assert_eq!(output["world_1"], 1);
        // pure punctuation yields no token at all
        assert!(output.get("---").is_none());
    }

    #[test]
    fn test_wordcount_rejects_bad_payload() {
        let spec = TaskSpec {
            tid: "wc1".to_string(),
            kind: WORDCOUNT_KIND.to_string(),
            payload: serde_json::json!({ "wrong": true }),
        };
        assert!(WordCountTask::from_spec(&spec).is_err());
    }

    #[test]
    fn test_project_turns_config_into_one_job() {
        let proj = WordCountProject::new();
        proj.init(r#"{"inputs":["a b","c"]}"#).unwrap();

        let jobs = proj.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind(), WORDCOUNT_KIND);

        let payload = jobs[0].task_payload(&proj.env());
        assert_eq!(payload["inputs"], serde_json::json!(["a b", "c"]));
    }

    #[test]
    fn test_project_rejects_malformed_config() {
        let proj = WordCountProject::new();
        assert!(proj.init("not json").is_err());
    }
}
