use axum::routing::{get, post};
use axum::{Extension, Router};
use pegasus::master::handlers::{
    handle_query_proj_status, handle_run_proj, handle_task_report, handle_task_status,
};
use pegasus::master::protocol::{
    ENDPOINT_PROJ_RUN, ENDPOINT_PROJ_STATUS, ENDPOINT_TASK_REPORT, ENDPOINT_TASK_STATUS,
};
use pegasus::master::{HttpJobRunner, JobRunner, ProjectDriver};
use pegasus::task::TaskRegistry;
use pegasus::worker::handlers::handle_task_new;
use pegasus::worker::protocol::ENDPOINT_TASK_NEW;
use pegasus::worker::report::spawn_status_reporter;
use pegasus::worker::{HttpReportSink, TaskEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --role master --bind <addr:port> [--worker <addr:port>]...",
            args[0]
        );
        eprintln!(
            "       {} --role worker --bind <addr:port> --master <addr:port> [--status-interval-ms <n>]",
            args[0]
        );

        std::process::exit(1);
    }

    let mut role: Option<String> = None;
    let mut bind_addr: Option<SocketAddr> = None;
    let mut workers: Vec<String> = vec![];
    let mut master_addr: Option<String> = None;
    let mut status_interval_ms: u64 = 5000;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--role" => {
                role = Some(args[i + 1].clone());
                i += 2;
            }
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--worker" => {
                workers.push(args[i + 1].clone());
                i += 2;
            }
            "--master" => {
                master_addr = Some(args[i + 1].clone());
                i += 2;
            }
            "--status-interval-ms" => {
                status_interval_ms = args[i + 1].parse()?;
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let role = role.expect("--role is required");
    let bind_addr = bind_addr.expect("--bind is required");

    let registry = TaskRegistry::new();
    pegasus::builtin::register(&registry);

    match role.as_str() {
        "master" => run_master(bind_addr, workers, registry).await,
        "worker" => {
            let master_addr = master_addr.expect("--master is required for the worker role");
            run_worker(bind_addr, master_addr, status_interval_ms, registry).await
        }
        other => {
            eprintln!("Unknown role {:?}, expected master or worker", other);
            std::process::exit(1);
        }
    }
}

async fn run_master(
    bind_addr: SocketAddr,
    workers: Vec<String>,
    registry: Arc<TaskRegistry>,
) -> anyhow::Result<()> {
    tracing::info!("Starting master on {}", bind_addr);
    if workers.is_empty() {
        tracing::warn!("No workers configured, every job dispatch will fail");
    } else {
        tracing::info!("Workers: {:?}", workers);
    }

    let job_runner: Arc<dyn JobRunner> = HttpJobRunner::new(workers);
    let driver = ProjectDriver::new(job_runner.clone());

    let app = Router::new()
        .route(ENDPOINT_PROJ_RUN, post(handle_run_proj))
        .route(ENDPOINT_PROJ_STATUS, get(handle_query_proj_status))
        .route(ENDPOINT_TASK_REPORT, post(handle_task_report))
        .route(ENDPOINT_TASK_STATUS, post(handle_task_status))
        .layer(Extension(driver))
        .layer(Extension(registry))
        .layer(Extension(job_runner));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Master listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_worker(
    bind_addr: SocketAddr,
    master_addr: String,
    status_interval_ms: u64,
    registry: Arc<TaskRegistry>,
) -> anyhow::Result<()> {
    tracing::info!("Starting worker on {}, master {}", bind_addr, master_addr);

    let sink = HttpReportSink::new(master_addr);
    let engine = TaskEngine::new(sink.clone());
    spawn_status_reporter(
        engine.clone(),
        sink,
        Duration::from_millis(status_interval_ms),
    );

    let app = Router::new()
        .route(ENDPOINT_TASK_NEW, post(handle_task_new))
        .layer(Extension(engine))
        .layer(Extension(registry));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Worker listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
