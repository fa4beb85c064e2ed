use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::core::{ContainerRect, DataRow};
use crate::error::EngineError;

use super::{CreatedView, EmbedOptions, RenderEngine, RenderView, SignalListener, StateFilter};

/// Mutation recorded by [`HeadlessEngine`] views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOperation {
    Insert { name: String, rows: usize },
    RemoveAll { name: String },
    Replace { name: String, rows: usize },
    SetState,
    Resize,
    Run,
}

#[derive(Default)]
struct HeadlessState {
    next_view_id: usize,
    live_view: Option<usize>,
    created: usize,
    disposed: usize,
    last_spec: Option<Value>,
    last_container: Option<ContainerRect>,
    last_options: Option<EmbedOptions>,
    datasets: IndexMap<String, Vec<DataRow>>,
    operations: Vec<ViewOperation>,
    listeners: Vec<(usize, String, SignalListener)>,
    interaction_state: Map<String, Value>,
    applied_states: Vec<Value>,
    fail_next_create: Option<String>,
    reject_state_restore: bool,
    fail_existence_checks: bool,
}

/// Engine without any drawing backend, used by tests and headless hosts.
///
/// Every view shares one inspection handle: datasets, recorded operations,
/// signal listeners and interaction state can be read or driven from the
/// engine clone kept by the caller.
#[derive(Clone, Default)]
pub struct HeadlessEngine {
    shared: Rc<RefCell<HeadlessState>>,
}

impl HeadlessEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.shared.borrow().created
    }

    #[must_use]
    pub fn disposed_count(&self) -> usize {
        self.shared.borrow().disposed
    }

    /// Number of views created and not yet finalized.
    #[must_use]
    pub fn live_view_count(&self) -> usize {
        let state = self.shared.borrow();
        state.created - state.disposed
    }

    #[must_use]
    pub fn last_spec(&self) -> Option<Value> {
        self.shared.borrow().last_spec.clone()
    }

    #[must_use]
    pub fn last_container(&self) -> Option<ContainerRect> {
        self.shared.borrow().last_container
    }

    #[must_use]
    pub fn last_options(&self) -> Option<EmbedOptions> {
        self.shared.borrow().last_options
    }

    #[must_use]
    pub fn dataset(&self, name: &str) -> Option<Vec<DataRow>> {
        self.shared.borrow().datasets.get(name).cloned()
    }

    #[must_use]
    pub fn operations(&self) -> Vec<ViewOperation> {
        self.shared.borrow().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.shared.borrow_mut().operations.clear();
    }

    #[must_use]
    pub fn listened_signals(&self) -> Vec<String> {
        self.shared
            .borrow()
            .listeners
            .iter()
            .map(|(_, signal, _)| signal.clone())
            .collect()
    }

    /// Delivers `value` to every live listener of `signal`.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit_signal(&self, signal: &str, value: Value) -> usize {
        let mut listeners = std::mem::take(&mut self.shared.borrow_mut().listeners);
        let mut delivered = 0;
        for (_, name, listener) in &mut listeners {
            if name == signal {
                listener(signal, &value);
                delivered += 1;
            }
        }
        let mut state = self.shared.borrow_mut();
        listeners.append(&mut state.listeners);
        state.listeners = listeners;
        delivered
    }

    /// Sets one `data` entry of the interaction state returned by `get_state`.
    pub fn set_interaction_data(&self, name: impl Into<String>, value: Value) {
        self.shared
            .borrow_mut()
            .interaction_state
            .insert(name.into(), value);
    }

    #[must_use]
    pub fn applied_states(&self) -> Vec<Value> {
        self.shared.borrow().applied_states.clone()
    }

    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.shared.borrow_mut().fail_next_create = Some(message.into());
    }

    pub fn reject_state_restore(&self, reject: bool) {
        self.shared.borrow_mut().reject_state_restore = reject;
    }

    pub fn fail_existence_checks(&self, fail: bool) {
        self.shared.borrow_mut().fail_existence_checks = fail;
    }
}

impl RenderEngine for HeadlessEngine {
    type View = HeadlessView;

    fn create(
        &mut self,
        container: ContainerRect,
        spec: &Value,
        options: &EmbedOptions,
    ) -> Result<CreatedView<Self::View>, EngineError> {
        let mut state = self.shared.borrow_mut();
        if let Some(message) = state.fail_next_create.take() {
            return Err(EngineError::new(message));
        }

        let id = state.next_view_id;
        state.next_view_id += 1;
        state.created += 1;
        state.live_view = Some(id);
        state.last_spec = Some(spec.clone());
        state.last_container = Some(container);
        state.last_options = Some(*options);
        state.datasets.clear();
        state.interaction_state.clear();
        if let Some(name) = spec.pointer("/data/name").and_then(Value::as_str) {
            state.datasets.insert(name.to_owned(), Vec::new());
        }

        let shared = Rc::clone(&self.shared);
        let finalize = Box::new(move || {
            let mut state = shared.borrow_mut();
            state.disposed += 1;
            state.listeners.retain(|(view_id, _, _)| *view_id != id);
            if state.live_view == Some(id) {
                state.live_view = None;
                state.datasets.clear();
            }
        });

        Ok(CreatedView {
            view: HeadlessView {
                id,
                shared: Rc::clone(&self.shared),
            },
            compiled_spec: spec.clone(),
            finalize,
        })
    }
}

/// View produced by [`HeadlessEngine`].
pub struct HeadlessView {
    id: usize,
    shared: Rc<RefCell<HeadlessState>>,
}

impl HeadlessView {
    fn record(&self, operation: ViewOperation) {
        self.shared.borrow_mut().operations.push(operation);
    }
}

impl RenderView for HeadlessView {
    fn check_data(&self, name: &str) -> Result<(), EngineError> {
        let state = self.shared.borrow();
        if state.fail_existence_checks {
            return Err(EngineError::new("dataset lookup failed"));
        }
        if state.datasets.contains_key(name) {
            Ok(())
        } else {
            Err(EngineError::new(format!("unrecognized data set: {name}")))
        }
    }

    fn insert(&mut self, name: &str, rows: Vec<DataRow>) -> Result<(), EngineError> {
        let count = rows.len();
        self.shared
            .borrow_mut()
            .datasets
            .entry(name.to_owned())
            .or_default()
            .extend(rows);
        self.record(ViewOperation::Insert {
            name: name.to_owned(),
            rows: count,
        });
        Ok(())
    }

    fn remove_all(&mut self, name: &str) -> Result<(), EngineError> {
        if let Some(rows) = self.shared.borrow_mut().datasets.get_mut(name) {
            rows.clear();
        }
        self.record(ViewOperation::RemoveAll {
            name: name.to_owned(),
        });
        Ok(())
    }

    fn replace(&mut self, name: &str, rows: Vec<DataRow>) -> Result<(), EngineError> {
        let count = rows.len();
        self.shared
            .borrow_mut()
            .datasets
            .insert(name.to_owned(), rows);
        self.record(ViewOperation::Replace {
            name: name.to_owned(),
            rows: count,
        });
        Ok(())
    }

    fn get_state(&self, filter: &StateFilter) -> Option<Value> {
        let state = self.shared.borrow();
        let data: Map<String, Value> = state
            .interaction_state
            .iter()
            .filter(|(name, _)| filter.includes_data(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let mut snapshot = Map::new();
        snapshot.insert("data".to_owned(), Value::Object(data));
        Some(Value::Object(snapshot))
    }

    fn set_state(&mut self, state: &Value) -> Result<(), EngineError> {
        let mut shared = self.shared.borrow_mut();
        if shared.reject_state_restore {
            return Err(EngineError::new("state does not match view dataflow"));
        }
        if let Some(data) = state.get("data").and_then(Value::as_object) {
            for (name, value) in data {
                shared.interaction_state.insert(name.clone(), value.clone());
            }
        }
        shared.applied_states.push(state.clone());
        shared.operations.push(ViewOperation::SetState);
        Ok(())
    }

    fn add_signal_listener(
        &mut self,
        signal: &str,
        listener: SignalListener,
    ) -> Result<(), EngineError> {
        self.shared
            .borrow_mut()
            .listeners
            .push((self.id, signal.to_owned(), listener));
        Ok(())
    }

    fn resize(&mut self) {
        self.record(ViewOperation::Resize);
    }

    fn run(&mut self) -> Result<(), EngineError> {
        self.record(ViewOperation::Run);
        Ok(())
    }
}
