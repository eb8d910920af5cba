//! Input event fan-out with scoped subscriptions.
//!
//! The host publishes pointer and resize events; each mounted view holds a
//! [`Subscription`]. Dropping the subscription unsubscribes: the bus notices
//! the closed channel on its next publish and forgets the listener.

use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    /// Wheel travel in lines; positive scrolls up.
    Scroll { lines: f32 },
    Resize { width: u32, height: u32 },
}

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Sender<InputEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        Subscription { rx }
    }

    /// Delivers `event` to every live subscription and prunes dropped ones.
    pub fn publish(&mut self, event: InputEvent) {
        self.listeners.retain(|tx| tx.send(event).is_ok());
    }

    /// Listeners still registered. Dropped subscriptions disappear on the next publish.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Receiving end held by a view for as long as it is mounted.
pub struct Subscription {
    rx: Receiver<InputEvent>,
}

impl Subscription {
    /// Events published since the last drain, in order.
    pub fn drain(&self) -> TryIter<'_, InputEvent> {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_in_order() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(InputEvent::PointerDown { x: 1.0, y: 2.0 });
        bus.publish(InputEvent::PointerUp);

        let got: Vec<_> = a.drain().collect();
        assert_eq!(
            got,
            vec![InputEvent::PointerDown { x: 1.0, y: 2.0 }, InputEvent::PointerUp]
        );
        assert_eq!(b.drain().count(), 2);
        assert_eq!(a.drain().count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        {
            let _b = bus.subscribe();
            assert_eq!(bus.listener_count(), 2);
        }
        bus.publish(InputEvent::Resize { width: 10, height: 10 });
        assert_eq!(bus.listener_count(), 1);
        assert_eq!(a.drain().count(), 1);
    }
}
