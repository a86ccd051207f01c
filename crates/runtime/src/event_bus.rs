use crate::frame::Frame;

/// An event stamped with the frame it was emitted in.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub frame_index: u64,
    pub payload: E,
}

/// Ordered outbox of events for external collaborators.
///
/// Events are appended in emission order and handed out with [`EventBus::drain`].
#[derive(Debug)]
pub struct EventBus<E> {
    frame_index: u64,
    events: Vec<Event<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            frame_index: 0,
            events: Vec::new(),
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps subsequent events with `frame.index`.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame_index = frame.index;
    }

    pub fn emit(&mut self, payload: E) {
        self.events.push(Event {
            frame_index: self.frame_index,
            payload,
        });
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::FrameClock;

    #[test]
    fn records_events_with_frame_index() {
        let mut clock = FrameClock::default();
        let mut bus = EventBus::new();
        bus.emit("before");
        clock.tick(0.01);
        bus.begin_frame(clock.tick(0.01));
        bus.emit("after");

        let stamps: Vec<_> = bus.events().iter().map(|e| e.frame_index).collect();
        assert_eq!(stamps, vec![0, 1]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(7u32);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].payload, 7);
        assert!(bus.is_empty());
    }
}
