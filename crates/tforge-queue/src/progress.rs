//! Progress events via Redis Pub/Sub.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tforge_models::{JobId, WsMessage};

use crate::error::QueueResult;

/// Pub/Sub channel shared by every job.
pub const PROGRESS_CHANNEL: &str = "tforge:progress";

/// Destination for a job's progress lines.
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    async fn publish(&self, job_id: &JobId, message: WsMessage) -> QueueResult<()>;

    /// Publish a log line.
    async fn log(&self, job_id: &JobId, message: String) -> QueueResult<()> {
        self.publish(job_id, WsMessage::log(message)).await
    }
}

/// Progress event published to Redis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub message: WsMessage,
}

/// Channel for publishing/subscribing to progress events.
pub struct ProgressChannel {
    client: redis::Client,
}

impl ProgressChannel {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Subscribe to events from all jobs.
    pub async fn subscribe(&self) -> QueueResult<Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(PROGRESS_CHANNEL).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ProgressPublisher for ProgressChannel {
    async fn publish(&self, job_id: &JobId, message: WsMessage) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(&ProgressEvent {
            job_id: job_id.clone(),
            message,
        })?;

        debug!("Publishing progress event for job {}", job_id);
        conn.publish::<_, _, ()>(PROGRESS_CHANNEL, payload).await?;

        Ok(())
    }
}
