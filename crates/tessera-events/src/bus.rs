use tokio::sync::broadcast;

use crate::Event;

/// Unified event bus for the playback pipeline.
///
/// All components receive a cloned `EventBus` and publish events directly.
/// Subscribers receive all events from all components.
///
/// `publish()` is a sync call. If there are no subscribers, events are
/// silently dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all subscribers.
    ///
    /// Accepts any type that converts `Into<Event>`, so sub-enum values can
    /// be passed directly: `bus.publish(AssemblyEvent::EndOfStream { .. })`.
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    /// Subscribe to all future events.
    ///
    /// Slow subscribers receive `RecvError::Lagged(n)` instead of blocking
    /// producers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::{AssemblyStatus, StreamGroup};

    use super::*;
    use crate::AssemblyEvent;

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(AssemblyEvent::EndOfStream {
            group: StreamGroup::Webcam,
        });
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        bus.publish(AssemblyEvent::StatusChanged {
            group: StreamGroup::Screenshare,
            status: AssemblyStatus::Ready,
        });
        for rx in [&mut rx1, &mut rx2] {
            assert!(matches!(
                rx.recv().await.unwrap(),
                Event::Assembly(AssemblyEvent::StatusChanged {
                    status: AssemblyStatus::Ready,
                    ..
                })
            ));
        }
    }

    #[tokio::test]
    async fn lagged_subscriber_gets_error() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..10 {
            bus.publish(AssemblyEvent::Progress {
                group: StreamGroup::Webcam,
                processed: i,
                total: 10,
            });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }

    #[test]
    fn clone_shares_channel() {
        let bus1 = EventBus::new(16);
        let bus2 = bus1.clone();
        let mut rx = bus1.subscribe();
        bus2.publish(AssemblyEvent::EndOfStream {
            group: StreamGroup::Webcam,
        });
        assert!(rx.try_recv().is_ok());
    }
}
