use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::core::{ChartElement, SelectionModes, SelectionState, WidgetRef};
use crate::error::ChartResult;
use crate::extensions::{FormClearHelper, FormClearListener, ValueSource, WidgetStateStore};
use crate::interaction::{KeyedDebouncer, SignalInbox};
use crate::render::{RenderView, StateFilter};

use super::json_helpers::is_falsy;
use super::view_lifecycle::engine_error;

/// Element-state key under which the view's interaction state is persisted.
pub const VIEW_STATE_KEY: &str = "viewState";

/// Suffix of the view dataset holding a selector's active predicates.
pub const SELECTION_STORE_SUFFIX: &str = "_store";

/// Reduces a raw selection signal value to the payload kept in the
/// selection state.
///
/// A point selection wrapper `{"vlPoint": {"or": [...]}}` unwraps to its
/// point list; falsy results become an empty object.
#[must_use]
pub fn normalize_selection(raw: &Value) -> Value {
    let selected = raw
        .get("vlPoint")
        .and_then(|point| point.get("or"))
        .unwrap_or(raw);
    if is_falsy(selected) {
        Value::Object(Map::new())
    } else {
        selected.clone()
    }
}

/// Selection state shared with the form-clear listener.
#[derive(Debug, Default)]
struct SelectionContext {
    widget: Option<WidgetRef>,
    selectors: SelectionModes,
    fragment_id: Option<String>,
    selections: SelectionState,
}

impl SelectionContext {
    fn state_filter(&self) -> StateFilter {
        StateFilter {
            data: self
                .selectors
                .iter()
                .map(|selector| format!("{selector}{SELECTION_STORE_SUFFIX}"))
                .collect(),
            recurse: false,
        }
    }

    fn reset<S>(&mut self, store: &mut S) -> ChartResult<bool>
    where
        S: WidgetStateStore + ?Sized,
    {
        if self.selections.is_empty() {
            return Ok(false);
        }
        self.selections.clear();
        let Some(widget) = self.widget.as_ref() else {
            return Ok(false);
        };
        let empty = SelectionState::default().to_store_string()?;
        store.set_string_value(widget, empty, ValueSource::Ui, self.fragment_id.as_deref());
        debug!(widget = %widget.id, "chart selections reset");
        Ok(true)
    }
}

fn reset_listener<S>(
    context: Weak<RefCell<SelectionContext>>,
    store: Weak<RefCell<S>>,
) -> FormClearListener
where
    S: WidgetStateStore + 'static,
{
    Box::new(move || {
        let (Some(context), Some(store)) = (context.upgrade(), store.upgrade()) else {
            return;
        };
        if let Err(err) = context.borrow_mut().reset(&mut *store.borrow_mut()) {
            warn!(error = %err, "failed to reset chart selections");
        }
    })
}

/// Mirrors view selection signals into the widget-state store.
///
/// Listeners attached to a view only enqueue events in the inbox; `pump`
/// debounces them per selector and runs the selection handler once a
/// selector's quiet window has elapsed.
pub struct SelectionSynchronizer<S: WidgetStateStore + 'static> {
    context: Rc<RefCell<SelectionContext>>,
    store: Rc<RefCell<S>>,
    inbox: SignalInbox,
    debouncers: KeyedDebouncer<Value>,
    form_clear: FormClearHelper,
}

impl<S: WidgetStateStore + 'static> SelectionSynchronizer<S> {
    #[must_use]
    pub fn new(store: Rc<RefCell<S>>, debounce_window: Duration) -> Self {
        Self {
            context: Rc::new(RefCell::new(SelectionContext::default())),
            store,
            inbox: SignalInbox::new(),
            debouncers: KeyedDebouncer::new(debounce_window),
            form_clear: FormClearHelper::default(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Rc<RefCell<S>> {
        &self.store
    }

    #[must_use]
    pub fn selections(&self) -> SelectionState {
        self.context.borrow().selections.clone()
    }

    #[must_use]
    pub fn pending_signals(&self) -> usize {
        self.inbox.len() + self.debouncers.pending_count()
    }

    pub fn set_fragment_id(&mut self, fragment_id: Option<&str>) {
        self.context.borrow_mut().fragment_id = fragment_id.map(str::to_owned);
    }

    /// Restores persisted interaction state and attaches selector listeners
    /// to a freshly created view.
    ///
    /// Does nothing unless the element has an id and at least one selector.
    /// Returns `true` when listeners were attached.
    pub fn attach<V: RenderView>(
        &mut self,
        view: &mut V,
        element: &ChartElement,
        generation: u64,
    ) -> ChartResult<bool> {
        self.debouncers.clear();
        let widget = element
            .widget_ref()
            .filter(|_| !element.selection_mode.is_empty());
        let Some(widget) = widget else {
            self.form_clear.disconnect(&mut *self.store.borrow_mut());
            self.context.borrow_mut().widget = None;
            return Ok(false);
        };

        let view_state = self.store.borrow().element_state(&widget.id, VIEW_STATE_KEY);
        if let Some(view_state) = view_state {
            match view.set_state(&view_state) {
                Ok(()) => trace!(widget = %widget.id, "restored view state"),
                Err(err) => warn!(widget = %widget.id, error = %err, "failed to restore view state"),
            }
        }

        for selector in &element.selection_mode {
            view.add_signal_listener(selector, self.inbox.listener(generation))
                .map_err(engine_error("add_signal_listener"))?;
        }

        {
            let mut context = self.context.borrow_mut();
            context.widget = Some(widget);
            context.selectors = element.selection_mode.clone();
        }

        let context = Rc::downgrade(&self.context);
        let store = Rc::downgrade(&self.store);
        self.form_clear.manage(
            &mut *self.store.borrow_mut(),
            element.form_id.as_deref(),
            move || reset_listener(context, store),
        );

        debug!(
            generation,
            selectors = element.selection_mode.len(),
            "selection listeners attached"
        );
        Ok(true)
    }

    /// Feeds queued signal events into the debouncers and handles every
    /// selector whose window elapsed by `now`.
    ///
    /// Events from other generations than `generation` are dropped, as are
    /// all events when no view is live. A selection whose handler fails is
    /// logged and does not keep later selections from being handled.
    /// Returns the number of handled selections.
    pub fn pump<V: RenderView>(
        &mut self,
        view: Option<&V>,
        generation: u64,
        now: Duration,
    ) -> ChartResult<usize> {
        for event in self.inbox.take() {
            if view.is_none() || event.generation != generation {
                trace!(
                    signal = %event.signal,
                    event_generation = event.generation,
                    generation,
                    "dropping stale signal"
                );
                continue;
            }
            self.debouncers.push(&event.signal, event.at, event.value);
        }
        self.inbox.set_now(now);

        let Some(view) = view else {
            self.debouncers.clear();
            return Ok(0);
        };
        let mut handled = 0;
        for (selector, value) in self.debouncers.drain_due(now) {
            match self.handle_signal(view, &selector, &value) {
                Ok(_) => handled += 1,
                Err(err) => warn!(selector = %selector, error = %err, "failed to handle selection"),
            }
        }
        Ok(handled)
    }

    /// Persists the view state, merges `raw` into the selection state and
    /// writes the serialized state to the store if it changed.
    ///
    /// Returns `true` when the store value was written.
    pub fn handle_signal<V: RenderView + ?Sized>(
        &mut self,
        view: &V,
        selector: &str,
        raw: &Value,
    ) -> ChartResult<bool> {
        let mut context = self.context.borrow_mut();
        let Some(widget) = context.widget.clone() else {
            return Ok(false);
        };

        if let Some(view_state) = view.get_state(&context.state_filter()) {
            self.store
                .borrow_mut()
                .set_element_state(&widget.id, VIEW_STATE_KEY, view_state);
        }

        context.selections.set(selector, normalize_selection(raw));
        let serialized = context.selections.to_store_string()?;

        let current = self.store.borrow().string_value(&widget);
        if current.as_deref() == Some(serialized.as_str()) {
            trace!(widget = %widget.id, selector, "selection unchanged, skipping store write");
            return Ok(false);
        }
        self.store.borrow_mut().set_string_value(
            &widget,
            serialized,
            ValueSource::Ui,
            context.fragment_id.as_deref(),
        );
        trace!(widget = %widget.id, selector, "selection written to store");
        Ok(true)
    }

    /// Clears the selection state and writes an empty selection to the store.
    ///
    /// No-op when nothing is selected.
    pub fn reset(&mut self) -> ChartResult<bool> {
        self.context
            .borrow_mut()
            .reset(&mut *self.store.borrow_mut())
    }

    /// Drops pending signals, forgets the selection state and disconnects
    /// the form-clear listener.
    pub fn detach(&mut self) {
        self.inbox.take();
        self.debouncers.clear();
        self.form_clear.disconnect(&mut *self.store.borrow_mut());
        *self.context.borrow_mut() = SelectionContext::default();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use serde_json::json;

    use super::{SelectionSynchronizer, normalize_selection};
    use crate::core::{ChartElement, ContainerRect};
    use crate::extensions::MemoryWidgetStore;
    use crate::render::{EmbedOptions, HeadlessEngine, RenderEngine};

    #[test]
    fn point_wrapper_unwraps_to_or_list() {
        assert_eq!(
            normalize_selection(&json!({"vlPoint": {"or": [{"x": 1}]}, "x": [1]})),
            json!([{"x": 1}])
        );
    }

    #[test]
    fn interval_payload_is_kept_and_falsy_becomes_empty_object() {
        assert_eq!(
            normalize_selection(&json!({"x": [1, 5]})),
            json!({"x": [1, 5]})
        );
        assert_eq!(normalize_selection(&json!(null)), json!({}));
        assert_eq!(normalize_selection(&json!({"vlPoint": {"or": null}})), json!({}));
        assert_eq!(normalize_selection(&json!({"vlPoint": {}})), json!({"vlPoint": {}}));
    }

    #[test]
    fn selections_due_together_are_all_handled_in_one_pump() {
        let store = Rc::new(RefCell::new(MemoryWidgetStore::new()));
        let mut engine = HeadlessEngine::new();
        let created = engine
            .create(
                ContainerRect {
                    width: 400,
                    height: None,
                },
                &json!({}),
                &EmbedOptions::default(),
            )
            .expect("create");
        let mut view = created.view;

        let mut sync = SelectionSynchronizer::new(Rc::clone(&store), Duration::from_millis(150));
        let element = ChartElement::new("{}")
            .with_id("chart")
            .with_selection_mode(["brush", "legend", "pick"]);
        assert!(sync.attach(&mut view, &element, 1).expect("attach"));

        engine.emit_signal("brush", json!({"x": [1, 2]}));
        engine.emit_signal("legend", json!({"a": 1}));
        engine.emit_signal("pick", json!(null));

        let handled = sync
            .pump(Some(&view), 1, Duration::from_millis(150))
            .expect("pump");
        assert_eq!(handled, 3);
        assert_eq!(sync.pending_signals(), 0);
        assert_eq!(sync.selections().select.len(), 3);
        assert_eq!(store.borrow().string_writes().len(), 3);
    }
}
