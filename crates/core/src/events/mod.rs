use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::WaveParameters;

/// Notification surfaced to application code by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// Bridge initialisation finished. Emitted once per node.
    Initialized,
    /// The bridge reported a new parameter set.
    WaveParametersUpdated(WaveParameters),
    /// The bridge reported a power state change.
    PowerStateUpdated(bool),
    /// The bridge reported a brightness change.
    BrightnessUpdated(u8),
}

/// Fan-out of [`NodeEvent`]s to any number of channel subscribers.
///
/// Subscribers receive every event published after they subscribed, in
/// publication order, and are served in registration order.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<NodeEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<NodeEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers `event` to every live subscriber, dropping the ones whose
    /// receiver has gone away.
    pub fn publish(&mut self, event: NodeEvent) {
        tracing::trace!(?event, subscribers = self.subscribers.len(), "publishing node event");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_sees_events_in_order() {
        let mut bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(NodeEvent::PowerStateUpdated(true));
        bus.publish(NodeEvent::BrightnessUpdated(7));

        for receiver in [first, second] {
            let events: Vec<_> = receiver.try_iter().collect();
            assert_eq!(
                events,
                vec![NodeEvent::PowerStateUpdated(true), NodeEvent::BrightnessUpdated(7)]
            );
        }
    }

    #[test]
    fn late_subscribers_do_not_see_earlier_events() {
        let mut bus = EventBus::new();
        bus.publish(NodeEvent::Initialized);
        let late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn prunes_dropped_subscribers() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(NodeEvent::Initialized);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), NodeEvent::Initialized);
    }
}
