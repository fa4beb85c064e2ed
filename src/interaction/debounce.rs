use std::time::Duration;

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
struct Pending<T> {
    deadline: Duration,
    value: T,
}

/// Trailing-edge debouncer over a host-driven clock.
///
/// Every `push` restarts the quiet window and replaces the pending value, so
/// a burst collapses into one delivery of its most recent value once the
/// window elapses without further pushes.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailingDebouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

impl<T> TrailingDebouncer<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules `value` for delivery at `at + window`.
    ///
    /// Returns `true` when a pending value was superseded.
    pub fn push(&mut self, at: Duration, value: T) -> bool {
        let superseded = self.pending.is_some();
        self.pending = Some(Pending {
            deadline: at.saturating_add(self.window),
            value,
        });
        superseded
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value if its deadline is at or before `now`.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        if self.deadline()? > now {
            return None;
        }
        self.pending.take().map(|pending| pending.value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Independent trailing debouncers addressed by key.
///
/// Keys never delay each other; only pushes to the same key collapse.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedDebouncer<T> {
    window: Duration,
    entries: IndexMap<String, TrailingDebouncer<T>>,
}

impl<T> KeyedDebouncer<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: IndexMap::new(),
        }
    }

    pub fn push(&mut self, key: &str, at: Duration, value: T) -> bool {
        let window = self.window;
        self.entries
            .entry(key.to_owned())
            .or_insert_with(|| TrailingDebouncer::new(window))
            .push(at, value)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|debouncer| debouncer.is_pending())
            .count()
    }

    /// Earliest pending deadline across all keys.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries
            .values()
            .filter_map(TrailingDebouncer::deadline)
            .min()
    }

    /// Takes every value whose window elapsed by `now`, ordered by deadline.
    ///
    /// Keys with equal deadlines keep their first-push order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<(String, T)> {
        let mut due: Vec<(Duration, String, T)> = self
            .entries
            .iter_mut()
            .filter_map(|(key, debouncer)| {
                let deadline = debouncer.deadline()?;
                debouncer
                    .poll(now)
                    .map(|value| (deadline, key.clone(), value))
            })
            .collect();
        due.sort_by_key(|(deadline, _, _)| *deadline);
        due.into_iter().map(|(_, key, value)| (key, value)).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{KeyedDebouncer, TrailingDebouncer};

    const WINDOW: Duration = Duration::from_millis(150);

    #[test]
    fn burst_collapses_to_trailing_value() {
        let mut debouncer = TrailingDebouncer::new(WINDOW);
        assert!(!debouncer.push(Duration::ZERO, 1));
        assert!(debouncer.push(Duration::from_millis(100), 2));

        assert_eq!(debouncer.poll(Duration::from_millis(200)), None);
        assert_eq!(debouncer.poll(Duration::from_millis(250)), Some(2));
        assert_eq!(debouncer.poll(Duration::from_millis(400)), None);
    }

    #[test]
    fn keys_fire_independently_in_deadline_order() {
        let mut debouncer = KeyedDebouncer::new(WINDOW);
        debouncer.push("legend", Duration::from_millis(20), "b");
        debouncer.push("brush", Duration::from_millis(10), "a");
        debouncer.push("brush", Duration::from_millis(100), "c");

        assert_eq!(debouncer.next_deadline(), Some(Duration::from_millis(170)));
        let due = debouncer.drain_due(Duration::from_millis(200));
        assert_eq!(due, vec![("legend".to_owned(), "b")]);
        assert_eq!(debouncer.pending_count(), 1);

        let due = debouncer.drain_due(Duration::from_millis(250));
        assert_eq!(due, vec![("brush".to_owned(), "c")]);
        assert_eq!(debouncer.pending_count(), 0);
    }
}
