//! Job substrate for TubeForge.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams, with a DLQ for failed runs
//! - An in-process queue for single-process deployments
//! - Job status records (Redis with TTL, or in memory)
//! - Progress events via Redis Pub/Sub and the in-process `ProgressSink`

pub mod error;
pub mod job;
pub mod progress;
pub mod queue;
pub mod sink;
pub mod status;
pub mod submit;

pub use error::{QueueError, QueueResult};
pub use job::GenerateVideoJob;
pub use progress::{ProgressChannel, ProgressEvent, ProgressPublisher, PROGRESS_CHANNEL};
pub use queue::{JobQueue, QueueConfig};
pub use sink::{ProgressSink, SubscriberId, Subscription, SUBSCRIBER_BUFFER};
pub use status::{JobStatusStore, MemoryStatusStore, RedisStatusStore, JOB_STATUS_TTL_SECS};
pub use submit::{JobSubmitter, LocalQueue};
