use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use tracing::trace;

use crate::render::SignalListener;

/// Signal value delivered by a view listener, stamped on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    /// Generation of the view that emitted the event.
    pub generation: u64,
    pub signal: String,
    pub value: Value,
    pub at: Duration,
}

/// Queue shared between view listeners and the component that drains them.
///
/// Listeners only enqueue; handling happens when the owner drains the inbox,
/// so a listener never needs access to the view or the store.
#[derive(Debug, Clone, Default)]
pub struct SignalInbox {
    events: Rc<RefCell<Vec<SignalEvent>>>,
    clock: Rc<Cell<Duration>>,
}

impl SignalInbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.get()
    }

    pub fn set_now(&self, now: Duration) {
        self.clock.set(now);
    }

    /// Builds a listener that enqueues events tagged with `generation`.
    #[must_use]
    pub fn listener(&self, generation: u64) -> SignalListener {
        let events = Rc::clone(&self.events);
        let clock = Rc::clone(&self.clock);
        Box::new(move |signal: &str, value: &Value| {
            trace!(signal, generation, "signal received");
            events.borrow_mut().push(SignalEvent {
                generation,
                signal: signal.to_owned(),
                value: value.clone(),
                at: clock.get(),
            });
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Removes and returns every queued event in arrival order.
    pub fn take(&self) -> Vec<SignalEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::SignalInbox;

    #[test]
    fn listener_stamps_generation_and_clock() {
        let inbox = SignalInbox::new();
        let mut listener = inbox.listener(3);
        inbox.set_now(Duration::from_millis(40));
        listener("brush", &json!({"x": [1, 2]}));

        let events = inbox.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].generation, 3);
        assert_eq!(events[0].signal, "brush");
        assert_eq!(events[0].at, Duration::from_millis(40));
        assert!(inbox.is_empty());
    }
}
