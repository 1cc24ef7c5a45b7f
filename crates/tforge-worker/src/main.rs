//! Video generation worker binary.

use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tforge_media::check_ffmpeg;
use tforge_queue::{JobQueue, ProgressChannel, QueueConfig, RedisStatusStore};
use tforge_store::TrendSourceStore;
use tforge_worker::{
    AgentConfig, AgentRegistry, ArtifactArea, Coordinator, JobExecutor, JobRunner, WorkerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    info!("Starting tforge-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("Failed to start metrics exporter")?;
        info!("Metrics exporter listening on port {}", port);
    }

    if let Err(e) = check_ffmpeg() {
        warn!("{}; video assembly will fail until FFmpeg is installed", e);
    }

    let queue_config = QueueConfig::from_env();
    let sources = TrendSourceStore::from_env().context("Failed to open trend source store")?;
    let artifacts = Arc::new(ArtifactArea::new(&config.content_dir).context("Failed to create artifact area")?);
    let agents = AgentRegistry::from_config(&AgentConfig::from_env(), sources, artifacts)
        .context("Failed to configure stage agents")?;

    let progress = Arc::new(ProgressChannel::new(&queue_config.redis_url)?);
    let status = Arc::new(RedisStatusStore::from_env()?);

    let coordinator = Coordinator::new(agents, progress).with_stage_timeout(config.stage_timeout);
    let runner = JobRunner::new(Arc::new(coordinator), status);
    let queue = JobQueue::new(queue_config).context("Failed to create job queue")?;
    let executor = Arc::new(JobExecutor::new(config, queue, runner));

    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_executor.shutdown();
    });

    executor.run().await?;

    info!("Worker shutdown complete");
    Ok(())
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
