//! cluster event notifications.
//!
//! the [`EventBus`] broadcasts state-change events (peers joining and
//! leaving, realms registering, alerts firing) to any number of
//! subscribers, with a dedicated dispatcher task consuming the channel.
//! delivery is fire-and-forget: no ordering guarantee relative to the
//! mutation that triggered the event, and no delivery guarantee if the
//! process exits right after.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

/// a cluster state-change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// a peer joined the federation.
    PeerJoined {
        /// the joining realm.
        realm: String,
    },
    /// a peer left the federation.
    PeerLeft {
        /// the departing realm.
        realm: String,
    },
    /// a realm was registered with the global admin.
    RealmRegistered {
        /// the registered realm.
        realm: String,
    },
    /// a realm was unregistered from the global admin.
    RealmUnregistered {
        /// the removed realm.
        realm: String,
    },
    /// an alert was fired.
    AlertFired {
        /// the realm the alert concerns.
        realm: String,
        /// alert message.
        message: String,
    },
}

struct BusInner {
    sender: broadcast::Sender<Event>,
}

/// broadcast bus for cluster events.
///
/// all clones share the same channel. if a subscriber falls behind it
/// receives `RecvError::Lagged` and simply misses events - consistent
/// with the no-delivery-guarantee contract.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// create a bus with capacity for 64 in-flight events.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(BusInner { sender }),
        }
    }

    /// subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.sender.subscribe()
    }

    /// publish an event.
    ///
    /// never blocks and never fails; without subscribers the event is
    /// dropped.
    pub fn publish(&self, event: Event) {
        let _ = self.inner.sender.send(event);
    }

    /// spawn the logging dispatcher task.
    ///
    /// consumes events until the bus (all senders) is dropped.
    pub fn spawn_dispatcher(&self) -> tokio::task::JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => info!(?event, "cluster event"),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        info!(missed, "event dispatcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(Event::PeerJoined {
            realm: "realm-b".to_string(),
        });

        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("should receive in time")
            .expect("channel open");
        assert_eq!(
            event,
            Event::PeerJoined {
                realm: "realm-b".to_string()
            }
        );
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(Event::AlertFired {
            realm: "realm-a".to_string(),
            message: "down".to_string(),
        });
    }

    #[tokio::test]
    async fn clones_share_the_channel() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        clone.publish(Event::PeerLeft {
            realm: "realm-c".to_string(),
        });

        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("should receive in time")
            .expect("channel open");
        assert!(matches!(event, Event::PeerLeft { .. }));
    }
}
