//! Job submission seam.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{QueueError, QueueResult};
use crate::job::GenerateVideoJob;

/// Hands a job to whatever executes it.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, job: GenerateVideoJob) -> QueueResult<()>;
}

/// In-process queue feeding a local executor.
#[derive(Clone)]
pub struct LocalQueue {
    sender: mpsc::UnboundedSender<GenerateVideoJob>,
}

impl LocalQueue {
    /// Create the queue and the receiver the executor drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GenerateVideoJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobSubmitter for LocalQueue {
    async fn submit(&self, job: GenerateVideoJob) -> QueueResult<()> {
        debug!("Queued job {} locally", job.job_id);
        self.sender.send(job).map_err(|_| QueueError::Closed)
    }
}
