//! In-process fan-out of progress frames to live subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use tforge_models::{JobId, WsMessage};

use crate::error::QueueResult;
use crate::progress::ProgressPublisher;

/// Frames buffered per subscriber before new ones are dropped for it.
pub const SUBSCRIBER_BUFFER: usize = 64;

pub type SubscriberId = u64;

/// A registered observer's end of the stream.
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<WsMessage>,
}

/// Registry of live observers.
///
/// Every frame goes to every subscriber. Notification never waits on a
/// subscriber: a full buffer loses that frame, a closed one is removed.
#[derive(Default)]
pub struct ProgressSink {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<WsMessage>>>,
    next_id: AtomicU64,
}

impl ProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        debug!(subscriber = id, "Progress subscriber registered");
        Subscription { id, receiver }
    }

    pub fn deregister(&self, id: SubscriberId) {
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed.is_some() {
            debug!(subscriber = id, "Progress subscriber deregistered");
        }
    }

    /// Deliver `message` to every subscriber. Returns how many accepted it.
    pub fn notify(&self, message: &WsMessage) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            for (id, sender) in subscribers.iter() {
                match sender.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(subscriber = *id, "Subscriber lagging, frame dropped");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        for id in closed {
            self.deregister(id);
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl ProgressPublisher for ProgressSink {
    async fn publish(&self, _job_id: &JobId, message: WsMessage) -> QueueResult<()> {
        self.notify(&message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let sink = ProgressSink::new();
        let mut a = sink.register();
        let mut b = sink.register();

        assert_eq!(sink.notify(&WsMessage::log("one")), 2);

        assert_eq!(a.receiver.recv().await.unwrap().message(), "one");
        assert_eq!(b.receiver.recv().await.unwrap().message(), "one");
    }

    #[tokio::test]
    async fn test_deregistered_subscriber_gets_nothing() {
        let sink = ProgressSink::new();
        let mut a = sink.register();
        let mut b = sink.register();

        sink.deregister(a.id);
        assert_eq!(sink.notify(&WsMessage::log("x")), 1);
        assert_eq!(sink.subscriber_count(), 1);
        assert!(a.receiver.recv().await.is_none());
        assert_eq!(b.receiver.recv().await.unwrap(), WsMessage::log("x"));
    }

    #[test]
    fn test_closed_subscriber_is_pruned() {
        let sink = ProgressSink::new();
        let a = sink.register();
        drop(a);

        assert_eq!(sink.notify(&WsMessage::log("x")), 0);
        assert_eq!(sink.subscriber_count(), 0);
    }

    #[test]
    fn test_full_subscriber_misses_frames_but_stays() {
        let sink = ProgressSink::new();
        let mut slow = sink.register();

        for i in 0..SUBSCRIBER_BUFFER + 5 {
            sink.notify(&WsMessage::log(format!("line {i}")));
        }

        assert_eq!(sink.subscriber_count(), 1);
        let mut received = 0;
        while slow.receiver.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_BUFFER);
    }

    #[tokio::test]
    async fn test_publisher_impl_broadcasts() {
        let sink = ProgressSink::new();
        let mut sub = sink.register();

        sink.log(&JobId::new(), "Selected topic: Mars".to_string()).await.unwrap();
        assert_eq!(sub.receiver.recv().await.unwrap(), WsMessage::log("Selected topic: Mars"));
    }
}
