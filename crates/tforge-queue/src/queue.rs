//! Job queue using Redis Streams.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamAutoClaimReply, StreamId, StreamPendingReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::GenerateVideoJob;
use crate::submit::JobSubmitter;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// Idle time after which another worker may claim a pending job
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "tforge:jobs".to_string(),
            consumer_group: "tforge:workers".to_string(),
            dlq_stream_name: "tforge:dlq".to_string(),
            visibility_timeout: Duration::from_secs(900),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM").unwrap_or(defaults.dlq_stream_name),
            visibility_timeout: std::env::var("QUEUE_VISIBILITY_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.visibility_timeout),
        }
    }
}

/// Stream entry fields.
const FIELD_JOB: &str = "job";
const FIELD_ERROR: &str = "error";
const FIELD_ORIGINAL_ID: &str = "original_id";

type Delivery = (String, GenerateVideoJob);

/// Generation jobs on a Redis stream read through one consumer group.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    async fn conn(&self) -> QueueResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::unavailable(e.to_string()))
    }

    /// Create the stream and consumer group. Safe to call on every start.
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let created: Result<(), redis::RedisError> = conn
            .xgroup_create_mkstream(&self.config.stream_name, &self.config.consumer_group, "$")
            .await;

        match created {
            Ok(()) => info!(group = %self.config.consumer_group, "Created consumer group"),
            Err(e) if e.code() == Some("BUSYGROUP") => {
                debug!(group = %self.config.consumer_group, "Consumer group already exists")
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Append a job, returning its stream message id.
    pub async fn enqueue(&self, job: &GenerateVideoJob) -> QueueResult<String> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.conn().await?;

        let message_id: String = conn
            .xadd(&self.config.stream_name, "*", &[(FIELD_JOB, payload.as_str())])
            .await
            .map_err(|e| QueueError::rejected(e.to_string()))?;

        info!(job_id = %job.job_id, message_id = %message_id, "Enqueued job");
        Ok(message_id)
    }

    /// Acknowledge a delivery and remove it from the stream.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        conn.xack::<_, _, _, ()>(&self.config.stream_name, &self.config.consumer_group, &[message_id])
            .await?;
        conn.xdel::<_, _, ()>(&self.config.stream_name, &[message_id]).await?;
        debug!(message_id, "Acknowledged job");
        Ok(())
    }

    /// Record a failed job on the dead-letter stream, then acknowledge it.
    pub async fn dlq(&self, message_id: &str, job: &GenerateVideoJob, error: &str) -> QueueResult<()> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.conn().await?;

        conn.xadd::<_, _, _, _, ()>(
            &self.config.dlq_stream_name,
            "*",
            &[(FIELD_JOB, payload.as_str()), (FIELD_ERROR, error), (FIELD_ORIGINAL_ID, message_id)],
        )
        .await?;
        self.ack(message_id).await?;

        warn!(job_id = %job.job_id, "Moved job to DLQ: {}", error);
        Ok(())
    }

    /// Entries currently on the job stream.
    pub async fn len(&self) -> QueueResult<u64> {
        Ok(self.conn().await?.xlen(&self.config.stream_name).await?)
    }

    pub async fn dlq_len(&self) -> QueueResult<u64> {
        Ok(self.conn().await?.xlen(&self.config.dlq_stream_name).await?)
    }

    /// Read up to `count` new jobs for `consumer`, blocking up to `block_ms`.
    pub async fn consume(&self, consumer: &str, block_ms: u64, count: usize) -> QueueResult<Vec<Delivery>> {
        let options = StreamReadOptions::default()
            .group(&self.config.consumer_group, consumer)
            .count(count)
            .block(block_ms as usize);

        let mut conn = self.conn().await?;
        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.config.stream_name], &[">"], &options)
            .await?;

        let entries = reply
            .map(|r| r.keys.into_iter().flat_map(|key| key.ids).collect())
            .unwrap_or_default();
        Ok(self.decode_entries(entries).await)
    }

    /// Reset the idle time of an entry `consumer` is still working on, so
    /// [`claim_pending`](Self::claim_pending) elsewhere leaves it alone.
    pub async fn touch(&self, consumer: &str, message_id: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: Vec<String> = redis::cmd("XCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer)
            .arg(0)
            .arg(message_id)
            .arg("JUSTID")
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Take over jobs idle longer than the visibility timeout.
    pub async fn claim_pending(&self, consumer: &str, count: usize) -> QueueResult<Vec<Delivery>> {
        let mut conn = self.conn().await?;

        let pending: StreamPendingReply = conn
            .xpending(&self.config.stream_name, &self.config.consumer_group)
            .await?;
        if pending.count() == 0 {
            return Ok(Vec::new());
        }

        let reply: StreamAutoClaimReply = redis::cmd("XAUTOCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer)
            .arg(self.config.visibility_timeout.as_millis() as u64)
            .arg("0-0")
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let claimed = self.decode_entries(reply.claimed).await;
        for (message_id, job) in &claimed {
            info!(job_id = %job.job_id, message_id = %message_id, "Claimed stale job");
        }
        Ok(claimed)
    }

    /// Undecodable entries are acknowledged and dropped.
    async fn decode_entries(&self, entries: Vec<StreamId>) -> Vec<Delivery> {
        let mut jobs = Vec::with_capacity(entries.len());

        for entry in entries {
            let decoded = entry
                .get::<String>(FIELD_JOB)
                .ok_or_else(|| "missing job field".to_string())
                .and_then(|payload| serde_json::from_str::<GenerateVideoJob>(&payload).map_err(|e| e.to_string()));

            match decoded {
                Ok(job) => jobs.push((entry.id, job)),
                Err(e) => {
                    warn!(message_id = %entry.id, "Dropping malformed queue entry: {}", e);
                    if let Err(ack_err) = self.ack(&entry.id).await {
                        warn!(message_id = %entry.id, "Failed to drop entry: {}", ack_err);
                    }
                }
            }
        }

        jobs
    }
}

#[async_trait]
impl JobSubmitter for JobQueue {
    async fn submit(&self, job: GenerateVideoJob) -> QueueResult<()> {
        self.enqueue(&job).await.map(|_| ())
    }
}
