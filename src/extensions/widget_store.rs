use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::WidgetRef;

/// Origin of a widget value write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    /// Produced by user interaction in the view.
    Ui,
    /// Produced by the owning application.
    Program,
}

/// Callback invoked when the owning form is cleared.
pub type FormClearListener = Box<dyn FnMut()>;

/// Handle of a registered form-clear listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// External store persisting widget values and per-element state blobs
/// across remounts.
///
/// A single store client is shared by every chart component; writes are
/// plain per-key overwrites.
pub trait WidgetStateStore {
    fn element_state(&self, element_id: &str, key: &str) -> Option<Value>;
    fn set_element_state(&mut self, element_id: &str, key: &str, value: Value);
    fn string_value(&self, widget: &WidgetRef) -> Option<String>;
    fn set_string_value(
        &mut self,
        widget: &WidgetRef,
        value: String,
        source: ValueSource,
        fragment_id: Option<&str>,
    );
    fn add_form_clear_listener(&mut self, form_id: &str, listener: FormClearListener)
    -> ListenerId;
    fn remove_form_clear_listener(&mut self, id: ListenerId);
}

/// String write recorded by [`MemoryWidgetStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringWrite {
    pub widget_id: String,
    pub value: String,
    pub source: ValueSource,
    pub fragment_id: Option<String>,
}

/// In-process store used by tests and single-page hosts.
#[derive(Default)]
pub struct MemoryWidgetStore {
    element_states: HashMap<(String, String), Value>,
    element_state_writes: usize,
    string_values: HashMap<String, String>,
    string_writes: Vec<StringWrite>,
    form_listeners: Vec<(ListenerId, String, FormClearListener)>,
    next_listener_id: u64,
}

impl MemoryWidgetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn string_writes(&self) -> &[StringWrite] {
        &self.string_writes
    }

    #[must_use]
    pub fn element_state_writes(&self) -> usize {
        self.element_state_writes
    }

    #[must_use]
    pub fn form_listener_count(&self, form_id: &str) -> usize {
        self.form_listeners
            .iter()
            .filter(|(_, form, _)| form == form_id)
            .count()
    }

    /// Invokes every listener registered for `form_id`.
    ///
    /// Listeners run without the store borrowed, so they may write back into
    /// it. Returns the number of listeners invoked.
    pub fn clear_form(store: &RefCell<Self>, form_id: &str) -> usize {
        let mut matching: Vec<(ListenerId, String, FormClearListener)> = {
            let mut inner = store.borrow_mut();
            let (matching, rest) = std::mem::take(&mut inner.form_listeners)
                .into_iter()
                .partition(|(_, form, _)| form == form_id);
            inner.form_listeners = rest;
            matching
        };
        for (_, _, listener) in &mut matching {
            listener();
        }
        let invoked = matching.len();
        store.borrow_mut().form_listeners.extend(matching);
        invoked
    }
}

impl WidgetStateStore for MemoryWidgetStore {
    fn element_state(&self, element_id: &str, key: &str) -> Option<Value> {
        self.element_states
            .get(&(element_id.to_owned(), key.to_owned()))
            .cloned()
    }

    fn set_element_state(&mut self, element_id: &str, key: &str, value: Value) {
        self.element_state_writes += 1;
        self.element_states
            .insert((element_id.to_owned(), key.to_owned()), value);
    }

    fn string_value(&self, widget: &WidgetRef) -> Option<String> {
        self.string_values.get(&widget.id).cloned()
    }

    fn set_string_value(
        &mut self,
        widget: &WidgetRef,
        value: String,
        source: ValueSource,
        fragment_id: Option<&str>,
    ) {
        self.string_writes.push(StringWrite {
            widget_id: widget.id.clone(),
            value: value.clone(),
            source,
            fragment_id: fragment_id.map(str::to_owned),
        });
        self.string_values.insert(widget.id.clone(), value);
    }

    fn add_form_clear_listener(
        &mut self,
        form_id: &str,
        listener: FormClearListener,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.form_listeners.push((id, form_id.to_owned(), listener));
        id
    }

    fn remove_form_clear_listener(&mut self, id: ListenerId) {
        self.form_listeners.retain(|(listener_id, _, _)| *listener_id != id);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::{MemoryWidgetStore, ValueSource, WidgetStateStore};
    use crate::core::WidgetRef;

    #[test]
    fn clear_form_listeners_may_write_back_into_the_store() {
        let store = Rc::new(RefCell::new(MemoryWidgetStore::new()));
        let widget = WidgetRef {
            id: "chart".to_owned(),
            form_id: Some("form".to_owned()),
        };
        let calls = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&store);
        let counter = Rc::clone(&calls);
        let listener_widget = widget.clone();
        store.borrow_mut().add_form_clear_listener(
            "form",
            Box::new(move || {
                counter.set(counter.get() + 1);
                if let Some(store) = weak.upgrade() {
                    store.borrow_mut().set_string_value(
                        &listener_widget,
                        "{}".to_owned(),
                        ValueSource::Ui,
                        None,
                    );
                }
            }),
        );

        assert_eq!(MemoryWidgetStore::clear_form(&store, "other"), 0);
        assert_eq!(MemoryWidgetStore::clear_form(&store, "form"), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(store.borrow().string_value(&widget).as_deref(), Some("{}"));
        assert_eq!(store.borrow().form_listener_count("form"), 1);
    }
}
