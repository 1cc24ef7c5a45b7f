//! The nine-step pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info_span, warn, Instrument};

use tforge_models::{JobId, JobRequest, RunResult};
use tforge_queue::ProgressPublisher;

use crate::agents::{
    ImageInput, MetadataInput, NarrationInput, ScriptInput, StageAgent, VideoInput,
};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::registry::AgentRegistry;

/// Characters of the script echoed in the progress line.
const SCRIPT_PREVIEW_CHARS: usize = 100;

/// Runs the stages strictly in order, feeding each output forward and
/// reporting a progress line after every step.
pub struct Coordinator {
    agents: AgentRegistry,
    progress: Arc<dyn ProgressPublisher>,
    stage_timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(agents: AgentRegistry, progress: Arc<dyn ProgressPublisher>) -> Self {
        Self {
            agents,
            progress,
            stage_timeout: None,
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Run the whole pipeline for one job.
    ///
    /// The first failing stage aborts the run; artifacts already written stay
    /// on disk.
    pub async fn execute(&self, job_id: &JobId, request: &JobRequest) -> WorkerResult<RunResult> {
        let logger = JobLogger::new(job_id, request);
        let span = logger.span();
        let start = Instant::now();

        async {
            logger.started(request);
            match self.run_pipeline(request, &logger).await {
                Ok(result) => {
                    logger.completed(&result, start.elapsed());
                    Ok(result)
                }
                Err(e) => {
                    logger.failed(&e);
                    self.report(&logger, format!("Workflow failed: {}", e)).await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(&self, request: &JobRequest, logger: &JobLogger) -> WorkerResult<RunResult> {
        let a = &self.agents;
        self.report(logger, format!("Starting workflow for niche: {}", request.niche))
            .await;

        let trends = self.run_stage(logger, a.trends.as_ref(), request.niche.clone()).await?;
        self.report(logger, format!("Trends analyzed: {}", to_json(&trends)))
            .await;

        let topic = self.run_stage(logger, a.topic.as_ref(), trends.clone()).await?;
        self.report(logger, format!("Selected topic: {}", topic)).await;

        let sentiment = self.run_stage(logger, a.sentiment.as_ref(), topic.clone()).await?;
        self.report(logger, format!("Sentiment detected: {}", sentiment))
            .await;

        let script = self
            .run_stage(
                logger,
                a.script.as_ref(),
                ScriptInput {
                    topic: topic.clone(),
                    sentiment,
                },
            )
            .await?;
        self.report(logger, format!("Script generated: {}...", preview(&script)))
            .await;

        let images = self
            .run_stage(
                logger,
                a.images.as_ref(),
                ImageInput {
                    topic: topic.clone(),
                    style: request.style.clone(),
                },
            )
            .await?;
        self.report(
            logger,
            format!(
                "Images generated: thumbnail={}, background={}",
                images.thumbnail.display(),
                images.background.display()
            ),
        )
        .await;

        let audio = self
            .run_stage(
                logger,
                a.narration.as_ref(),
                NarrationInput {
                    script: script.clone(),
                    language: request.language.clone(),
                },
            )
            .await?;
        self.report(logger, format!("Voiceover generated: {}", audio.display()))
            .await;

        let video = self
            .run_stage(
                logger,
                a.video.as_ref(),
                VideoInput {
                    thumbnail: images.thumbnail.clone(),
                    background: images.background.clone(),
                    audio: audio.clone(),
                    script: script.clone(),
                    sentiment,
                },
            )
            .await?;
        self.report(logger, format!("Video generated: {}", video.display()))
            .await;

        let interaction = if request.enable_interaction {
            let bundle = self.run_stage(logger, a.interaction.as_ref(), topic.clone()).await?;
            self.report(logger, format!("Interaction data: {}", to_json(&bundle)))
                .await;
            Some(bundle)
        } else {
            self.report(logger, "Interaction skipped".to_string()).await;
            None
        };

        let metadata = self
            .run_stage(
                logger,
                a.metadata.as_ref(),
                MetadataInput {
                    topic: topic.clone(),
                    script: script.clone(),
                    interaction: interaction.clone(),
                },
            )
            .await?;
        self.report(
            logger,
            format!("Metadata prepared: {}", metadata.artifact.display()),
        )
        .await;

        let result = RunResult {
            niche: request.niche.clone(),
            trends,
            topic,
            sentiment,
            script,
            style: images.style,
            thumbnail: images.thumbnail,
            background: images.background,
            audio,
            video,
            interaction,
            upload: metadata.upload,
            metadata: metadata.artifact,
        };

        self.report(logger, format!("Workflow completed: {}", to_json(&result)))
            .await;
        Ok(result)
    }

    async fn run_stage<A>(&self, logger: &JobLogger, agent: &A, input: A::Input) -> WorkerResult<A::Output>
    where
        A: StageAgent + ?Sized,
    {
        let stage = agent.stage();
        let span = info_span!("stage", stage = stage.as_str());
        let start = Instant::now();

        let run = agent.run(input).instrument(span);
        let result = match self.stage_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(outcome) => outcome.map_err(|e| WorkerError::stage(stage, e)),
                Err(_) => Err(WorkerError::StageTimeout {
                    stage,
                    secs: limit.as_secs(),
                }),
            },
            None => run.await.map_err(|e| WorkerError::stage(stage, e)),
        };

        let elapsed = start.elapsed();
        metrics::record_stage(stage, elapsed.as_secs_f64(), result.is_ok());
        if result.is_ok() {
            logger.stage_finished(stage, elapsed);
        }
        result
    }

    /// Publish a progress line. Delivery problems never fail the job.
    async fn report(&self, logger: &JobLogger, line: String) {
        logger.progress(&line);
        if let Err(e) = self.progress.log(logger.job_id(), line).await {
            warn!(job_id = %logger.job_id(), "Failed to publish progress: {}", e);
        }
    }
}

fn preview(script: &str) -> String {
    script.chars().take(SCRIPT_PREVIEW_CHARS).collect()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_counts_characters() {
        let script = "é".repeat(150);
        assert_eq!(preview(&script).chars().count(), 100);
        assert_eq!(preview("short"), "short");
    }
}
