//! Job status records.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::debug;

use tforge_models::{JobId, JobStatusRecord};

use crate::error::QueueResult;

/// Status records kept for 24 hours.
pub const JOB_STATUS_TTL_SECS: u64 = 24 * 60 * 60;

/// Where executors record job state and the API reads it back.
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    async fn put(&self, record: &JobStatusRecord) -> QueueResult<()>;

    /// `None` for ids never written (or expired).
    async fn get(&self, job_id: &JobId) -> QueueResult<Option<JobStatusRecord>>;
}

/// Redis string per job, refreshed on every write.
pub struct RedisStatusStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisStatusStore {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            ttl_secs: JOB_STATUS_TTL_SECS,
        })
    }

    /// Create from `REDIS_URL` and `JOB_STATUS_TTL_SECS`.
    pub fn from_env() -> QueueResult<Self> {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let ttl = std::env::var("JOB_STATUS_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(JOB_STATUS_TTL_SECS);
        Ok(Self::new(&url)?.with_ttl(ttl))
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn key(job_id: &JobId) -> String {
        format!("tforge:status:{}", job_id)
    }
}

#[async_trait]
impl JobStatusStore for RedisStatusStore {
    async fn put(&self, record: &JobStatusRecord) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(record)?;
        conn.set_ex::<_, _, ()>(Self::key(&record.job_id), payload, self.ttl_secs)
            .await?;
        debug!("Job {} is now {}", record.job_id, record.state);
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> QueueResult<Option<JobStatusRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::key(job_id)).await?;
        payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(Into::into)
    }
}

/// Process-local status map for single-process deployments.
#[derive(Default)]
pub struct MemoryStatusStore {
    records: RwLock<HashMap<JobId, JobStatusRecord>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStatusStore for MemoryStatusStore {
    async fn put(&self, record: &JobStatusRecord) -> QueueResult<()> {
        self.records
            .write()
            .await
            .insert(record.job_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> QueueResult<Option<JobStatusRecord>> {
        Ok(self.records.read().await.get(job_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tforge_models::{JobRequest, JobState};

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStatusStore::new();
        let id = JobId::new();

        assert!(store.get(&id).await.unwrap().is_none());

        let pending = JobStatusRecord::pending(id.clone(), JobRequest::new("cats"));
        store.put(&pending).await.unwrap();
        store.put(&pending.started()).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.state, JobState::Started);
    }

    #[test]
    fn test_redis_key() {
        let id = JobId::from_string("abc");
        assert_eq!(RedisStatusStore::key(&id), "tforge:status:abc");
    }
}
