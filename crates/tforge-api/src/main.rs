//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tforge_api::{create_router, metrics, relay_progress, ApiConfig, AppState, QueueBackend};
use tforge_queue::{JobQueue, LocalQueue, MemoryStatusStore, ProgressChannel, ProgressSink, RedisStatusStore};
use tforge_store::TrendSourceStore;
use tforge_worker::{
    AgentConfig, AgentRegistry, ArtifactArea, Coordinator, FeedCredentials, JobRunner, LocalExecutor,
    WorkerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    init_tracing()?;
    info!("Starting tforge-api");

    let config = ApiConfig::from_env();
    info!(
        "API config: host={}, port={}, backend={:?}",
        config.host, config.port, config.queue_backend
    );

    let sources = TrendSourceStore::from_env().context("Failed to open trend source store")?;
    sources
        .seed_defaults(std::env::var("YOUTUBE_API_KEY").ok())
        .context("Failed to seed trend sources")?;

    let state = build_state(config.clone(), sources).await?;

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wire the submission, status and progress backends for the configured mode.
async fn build_state(config: ApiConfig, sources: TrendSourceStore) -> anyhow::Result<AppState> {
    let sink = Arc::new(ProgressSink::new());
    let agent_config = AgentConfig::from_env();
    let credentials = FeedCredentials::from_config(&agent_config);

    let state = match config.queue_backend {
        QueueBackend::Redis => {
            let queue = Arc::new(JobQueue::from_env().context("Failed to create job queue")?);
            queue.init().await.context("Failed to initialize job stream")?;
            let status = Arc::new(RedisStatusStore::from_env()?);

            let channel = ProgressChannel::new(&queue.config().redis_url)?;
            tokio::spawn(relay_progress(channel, Arc::clone(&sink)));

            AppState::new(config, queue.clone(), status, sink, sources).with_queue(queue)
        }
        QueueBackend::Memory => {
            let worker_config = WorkerConfig::from_env();
            let artifacts = Arc::new(
                ArtifactArea::new(&worker_config.content_dir).context("Failed to create artifact area")?,
            );
            let agents = AgentRegistry::from_config(&agent_config, sources.clone(), artifacts)
                .context("Failed to configure stage agents")?;

            let status = Arc::new(MemoryStatusStore::new());
            let coordinator =
                Coordinator::new(agents, sink.clone()).with_stage_timeout(worker_config.stage_timeout);
            let runner = JobRunner::new(Arc::new(coordinator), status.clone());

            let (queue, receiver) = LocalQueue::channel();
            LocalExecutor::new(receiver, runner, worker_config.max_concurrent_jobs).spawn();
            info!("Running jobs in-process");

            AppState::new(config, Arc::new(queue), status, sink, sources)
        }
    };

    Ok(state.with_feed_credentials(credentials))
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("tforge=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; serve until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
