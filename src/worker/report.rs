//! Delivery of task reports and periodic status posts back to the master.
//! Both are best-effort: a failed POST is logged and the run's outcome is
//! otherwise unaffected.

use super::engine::TaskEngine;
use crate::master::protocol::{ENDPOINT_TASK_REPORT, ENDPOINT_TASK_STATUS};
use crate::task::{TaskReport, TaskStatus};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Where the engine ships reports and status posts. The HTTP
/// implementation talks to the master; tests substitute a capturing one.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver_report(&self, report: TaskReport);

    async fn deliver_status(&self, status: TaskStatus);
}

pub struct HttpReportSink {
    client: reqwest::Client,
    master_addr: String,
}

impl HttpReportSink {
    pub fn new(master_addr: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            client: reqwest::Client::new(),
            master_addr: master_addr.into(),
        })
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn deliver_report(&self, report: TaskReport) {
        tracing::info!("Send out task report for {:?}", report.tid);
        let url = format!("http://{}{}", self.master_addr, ENDPOINT_TASK_REPORT);
        match self.client.post(&url).json(&report).send().await {
            Ok(_) => tracing::info!("Send out task report for {:?} done", report.tid),
            // TODO retry delivery on failure
            Err(err) => {
                tracing::error!("Send out task report for {:?} failed, {}", report.tid, err)
            }
        }
    }

    async fn deliver_status(&self, status: TaskStatus) {
        let url = format!("http://{}{}", self.master_addr, ENDPOINT_TASK_STATUS);
        if let Err(err) = self.client.post(&url).json(&status).send().await {
            tracing::error!("Fail to post task status, {}", err);
        }
    }
}

/// Periodically posts the live task status to the master. Quiet while the
/// engine is free.
pub fn spawn_status_reporter(
    engine: Arc<TaskEngine>,
    sink: Arc<dyn ReportSink>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Some(status) = engine.task_status() {
                sink.deliver_status(status).await;
            }
        }
    })
}
