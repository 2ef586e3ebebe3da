// Change Broadcaster - fan-out of committed deltas to every observer
//
// One shared topic. Subscribing does not replay history: a joining observer
// fetches a snapshot separately and aligns the two by revision.

use crate::domain::QueueEvent;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Receive-side failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Subscriber fell behind and missed deltas; it must re-fetch a snapshot
    #[error("subscriber lagged, {0} events skipped")]
    Lagged(u64),

    #[error("broadcaster closed")]
    Closed,
}

/// In-memory broadcaster over `tokio::sync::broadcast`
pub struct ChangeBroadcaster {
    sender: broadcast::Sender<QueueEvent>,
    capacity: usize,
}

impl ChangeBroadcaster {
    /// `capacity` must be non-zero; `EngineConfig::validate` enforces it
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
        }
    }

    /// Publish a delta; returns the number of subscribers that will see it
    pub fn publish(&self, event: QueueEvent) -> usize {
        let topic = event.topic();
        let revision = event.revision();

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(topic, revision, receivers, "Event published");
                receivers
            }
            Err(_) => {
                // No subscribers: nothing to deliver
                debug!(topic, revision, "Event published with no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Handle held by one observer; dropping it unsubscribes
pub struct Subscription {
    receiver: broadcast::Receiver<QueueEvent>,
}

impl Subscription {
    /// Wait for the next delta
    pub async fn recv(&mut self) -> Result<QueueEvent, SubscriptionError> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Subscriber lagged behind broadcaster");
                Err(SubscriptionError::Lagged(skipped))
            }
            Err(broadcast::error::RecvError::Closed) => Err(SubscriptionError::Closed),
        }
    }

    /// Non-blocking variant; `Ok(None)` when nothing is pending
    pub fn try_recv(&mut self) -> Result<Option<QueueEvent>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                Err(SubscriptionError::Lagged(skipped))
            }
            Err(broadcast::error::TryRecvError::Closed) => Err(SubscriptionError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OperationalStatus;

    fn status_event(revision: u64) -> QueueEvent {
        QueueEvent::StatusUpdate {
            revision,
            status: OperationalStatus::Open,
        }
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let broadcaster = ChangeBroadcaster::new(8);
        assert_eq!(broadcaster.publish(status_event(1)), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let broadcaster = ChangeBroadcaster::new(8);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);

        assert_eq!(broadcaster.publish(status_event(1)), 2);

        assert_eq!(a.recv().await.unwrap().revision(), 1);
        assert_eq!(b.recv().await.unwrap().revision(), 1);
    }

    #[tokio::test]
    async fn test_no_history_for_late_subscriber() {
        let broadcaster = ChangeBroadcaster::new(8);
        let _early = broadcaster.subscribe();
        broadcaster.publish(status_event(1));

        let mut late = broadcaster.subscribe();
        assert_eq!(late.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let broadcaster = ChangeBroadcaster::new(2);
        let mut slow = broadcaster.subscribe();
        for revision in 1..=5 {
            broadcaster.publish(status_event(revision));
        }

        assert!(matches!(
            slow.recv().await,
            Err(SubscriptionError::Lagged(3))
        ));
        // After the lag the oldest retained event is delivered
        assert_eq!(slow.recv().await.unwrap().revision(), 4);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let broadcaster = ChangeBroadcaster::new(4);
        let sub = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
