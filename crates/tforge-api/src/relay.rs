//! Forwarding of worker progress from Redis into the local sink.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use tforge_queue::{ProgressChannel, ProgressSink};

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(2);

/// Relay every published progress event to the sink's subscribers.
///
/// Runs until the task is aborted, resubscribing whenever the Pub/Sub
/// connection drops.
pub async fn relay_progress(channel: ProgressChannel, sink: Arc<ProgressSink>) {
    loop {
        match channel.subscribe().await {
            Ok(mut events) => {
                info!("Subscribed to worker progress");
                while let Some(event) = events.next().await {
                    let delivered = sink.notify(&event.message);
                    debug!(job_id = %event.job_id, delivered, "Relayed progress event");
                }
                warn!("Progress subscription ended, resubscribing");
            }
            Err(e) => warn!("Failed to subscribe to progress: {}", e),
        }
        tokio::time::sleep(RESUBSCRIBE_DELAY).await;
    }
}
