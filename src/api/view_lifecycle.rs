use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::{ChartElement, ChartProps, Table};
use crate::error::{ChartError, ChartResult, EngineError};
use crate::render::{CreatedView, RenderView};

use super::{DataAction, reconcile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LifecyclePhase {
    #[default]
    Uninitialized,
    Created,
    Disposed,
}

/// Why an update has to rebuild the view instead of patching its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecreateReason {
    NoView,
    Spec,
    Theme,
    ThemeMode,
    Size,
    FullScreen,
    ContainerWidth,
    SelectionMode,
}

/// Compares the view-shaping inputs of two renders.
///
/// Returns `None` when only data changed and the live view can be patched.
#[must_use]
pub fn recreation_reason(prev: &ChartProps, next: &ChartProps) -> Option<RecreateReason> {
    let (before, after) = (&prev.element, &next.element);
    if before.spec != after.spec {
        Some(RecreateReason::Spec)
    } else if prev.theme != next.theme {
        Some(RecreateReason::Theme)
    } else if before.theme_mode != after.theme_mode {
        Some(RecreateReason::ThemeMode)
    } else if prev.width != next.width || prev.height != next.height {
        Some(RecreateReason::Size)
    } else if prev.is_full_screen != next.is_full_screen {
        Some(RecreateReason::FullScreen)
    } else if before.use_container_width != after.use_container_width {
        Some(RecreateReason::ContainerWidth)
    } else if before.selection_mode != after.selection_mode {
        Some(RecreateReason::SelectionMode)
    } else {
        None
    }
}

pub(crate) fn engine_error(operation: &'static str) -> impl FnOnce(EngineError) -> ChartError {
    move |source| ChartError::Engine { operation, source }
}

struct LiveView<V> {
    view: V,
    compiled_spec: Value,
    finalize: Option<Box<dyn FnOnce()>>,
}

/// Component-local view state: the live view, its disposer, the default
/// dataset name and the generation counter.
///
/// At most one view is live per slot; installing a new view finalizes the
/// previous one first, and dropping the slot finalizes whatever is live.
pub struct ViewSlot<V> {
    live: Option<LiveView<V>>,
    default_dataset_name: String,
    generation: u64,
    phase: LifecyclePhase,
}

impl<V> ViewSlot<V> {
    #[must_use]
    pub fn new(default_dataset_name: impl Into<String>) -> Self {
        Self {
            live: None,
            default_dataset_name: default_dataset_name.into(),
            generation: 0,
            phase: LifecyclePhase::Uninitialized,
        }
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Generation of the most recently installed view.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    #[must_use]
    pub fn default_dataset_name(&self) -> &str {
        &self.default_dataset_name
    }

    #[must_use]
    pub fn view(&self) -> Option<&V> {
        self.live.as_ref().map(|live| &live.view)
    }

    pub fn view_mut(&mut self) -> ChartResult<&mut V> {
        self.live
            .as_mut()
            .map(|live| &mut live.view)
            .ok_or(ChartError::DataNotYetReady)
    }

    #[must_use]
    pub fn compiled_spec(&self) -> Option<&Value> {
        self.live.as_ref().map(|live| &live.compiled_spec)
    }

    /// Finalizes the previous view (if any) and takes ownership of `created`.
    ///
    /// Returns the generation assigned to the new view.
    pub fn install(&mut self, created: CreatedView<V>) -> u64 {
        self.dispose();
        self.generation += 1;
        self.live = Some(LiveView {
            view: created.view,
            compiled_spec: created.compiled_spec,
            finalize: Some(created.finalize),
        });
        self.phase = LifecyclePhase::Created;
        debug!(generation = self.generation, "chart view installed");
        self.generation
    }

    /// Runs the retained disposer exactly once and forgets the view.
    ///
    /// Returns `false` when no view was live.
    pub fn dispose(&mut self) -> bool {
        let Some(mut live) = self.live.take() else {
            return false;
        };
        if let Some(finalize) = live.finalize.take() {
            finalize();
        }
        self.phase = LifecyclePhase::Disposed;
        debug!(generation = self.generation, "chart view disposed");
        true
    }

    /// Picks the dataset the element's primary data goes to.
    ///
    /// A single named dataset becomes the default; no named datasets falls
    /// back to `fallback`; several named datasets keep the current name.
    pub fn select_default_dataset_name(&mut self, element: &ChartElement, fallback: &str) {
        match element.datasets.len() {
            0 => fallback.clone_into(&mut self.default_dataset_name),
            1 => {
                if let Some(name) = element.datasets.keys().next() {
                    name.clone_into(&mut self.default_dataset_name);
                }
            }
            _ => {}
        }
        trace!(name = %self.default_dataset_name, "default dataset selected");
    }

    fn resolve_dataset_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name.is_empty() {
            &self.default_dataset_name
        } else {
            name
        }
    }
}

impl<V: RenderView> ViewSlot<V> {
    /// Inserts the element's primary and named datasets into a fresh view.
    pub fn insert_initial_data(&mut self, element: &ChartElement) -> ChartResult<()> {
        let default_name = self.default_dataset_name.clone();
        if let Some(data) = element.data.as_ref().filter(|data| !data.is_empty()) {
            self.view_mut()?
                .insert(&default_name, data.rows_from(0))
                .map_err(engine_error("insert"))?;
        }
        for (name, data) in &element.datasets {
            if data.is_empty() {
                continue;
            }
            let name = self.resolve_dataset_name(name).to_owned();
            self.view_mut()?
                .insert(&name, data.rows_from(0))
                .map_err(engine_error("insert"))?;
        }
        Ok(())
    }

    /// Reconciles one dataset and applies the resulting action to the view.
    pub fn update_data(
        &mut self,
        name: &str,
        prev: Option<&Table>,
        next: Option<&Table>,
    ) -> ChartResult<DataAction> {
        let view = self.view_mut()?;
        let action = reconcile(prev, next);
        trace!(dataset = name, ?action, "reconciled dataset");

        match (action, next) {
            (DataAction::NoOp, _) => {}
            (DataAction::Remove, _) => {
                if view.check_data(name).is_ok() {
                    view.remove_all(name).map_err(engine_error("remove"))?;
                } else {
                    trace!(dataset = name, "dataset absent from view, nothing to remove");
                }
            }
            (DataAction::InsertAll, Some(next)) => {
                view.insert(name, next.rows_from(0))
                    .map_err(engine_error("insert"))?;
            }
            (DataAction::InsertFrom(offset), Some(next)) => {
                view.insert(name, next.rows_from(offset))
                    .map_err(engine_error("insert"))?;
            }
            (DataAction::ReplaceAll, Some(next)) => {
                view.replace(name, next.rows_from(0))
                    .map_err(engine_error("replace"))?;
                debug!(dataset = name, "had to clear dataset before inserting rows");
            }
            (_, None) => {}
        }
        Ok(action)
    }

    /// Applies a data-only update from `prev` to `next`, then resizes and
    /// re-runs the view.
    pub fn patch_data(&mut self, prev: &ChartElement, next: &ChartElement) -> ChartResult<()> {
        let default_name = self.default_dataset_name.clone();

        if prev.data.is_some() || next.data.is_some() {
            self.update_data(&default_name, prev.data.as_ref(), next.data.as_ref())?;
        }

        // Snapshots pair up by element key; the view name may be the default.
        for (key, data) in &next.datasets {
            let name = self.resolve_dataset_name(key).to_owned();
            self.update_data(&name, prev.datasets.get(key), Some(data))?;
        }

        for key in prev.datasets.keys() {
            if next.datasets.contains_key(key) {
                continue;
            }
            let name = self.resolve_dataset_name(key).to_owned();
            if name != default_name {
                self.update_data(&name, None, None)?;
            }
        }

        self.resize_and_run()
    }

    /// Runs the initial dataflow pass, then a resize pass.
    pub fn initial_render(&mut self) -> ChartResult<()> {
        self.view_mut()?.run().map_err(engine_error("run"))?;
        self.resize_and_run()
    }

    pub fn resize_and_run(&mut self) -> ChartResult<()> {
        let view = self.view_mut()?;
        view.resize();
        view.run().map_err(engine_error("run"))
    }
}

impl<V> Drop for ViewSlot<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}
