use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{ChartProps, SelectionState};
use crate::error::{ChartError, ChartResult};
use crate::extensions::WidgetStateStore;
use crate::render::RenderEngine;

use super::{
    ChartSyncConfig, LifecyclePhase, RecreateReason, SelectionSynchronizer, SpecBuilder, ViewSlot,
    recreation_reason,
};

/// What an `update` did to the live view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderPass {
    /// The view was (re)built from scratch.
    Created(RecreateReason),
    /// Only datasets were reconciled into the live view.
    DataPatched,
    /// A previous failure is still reported; nothing was attempted.
    ErrorRetained,
}

/// One chart component: builds the spec, owns the live view, patches data
/// across renders and mirrors selections into the widget-state store.
///
/// The host drives it with `update` on every render and `advance_time` on
/// every tick of its event loop.
pub struct ChartView<E: RenderEngine, S: WidgetStateStore + 'static> {
    engine: E,
    config: ChartSyncConfig,
    spec_builder: SpecBuilder,
    slot: ViewSlot<E::View>,
    selection: SelectionSynchronizer<S>,
    props: Option<ChartProps>,
    error: Option<ChartError>,
    clock: Duration,
}

impl<E: RenderEngine, S: WidgetStateStore + 'static> ChartView<E, S> {
    pub fn new(engine: E, store: Rc<RefCell<S>>, config: ChartSyncConfig) -> ChartResult<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            spec_builder: SpecBuilder::new(config.bottom_padding_px),
            slot: ViewSlot::new(config.default_dataset_name.clone()),
            selection: SelectionSynchronizer::new(store, config.debounce_window()),
            config,
            props: None,
            error: None,
            clock: Duration::ZERO,
        })
    }

    #[must_use]
    pub fn with_spec_builder(mut self, spec_builder: SpecBuilder) -> Self {
        self.spec_builder = spec_builder;
        self
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[must_use]
    pub fn config(&self) -> &ChartSyncConfig {
        &self.config
    }

    #[must_use]
    pub fn props(&self) -> Option<&ChartProps> {
        self.props.as_ref()
    }

    /// Error captured by the most recent failed render, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ChartError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.slot.phase()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot.generation()
    }

    #[must_use]
    pub fn compiled_spec(&self) -> Option<&Value> {
        self.slot.compiled_spec()
    }

    #[must_use]
    pub fn default_dataset_name(&self) -> &str {
        self.slot.default_dataset_name()
    }

    #[must_use]
    pub fn selections(&self) -> SelectionState {
        self.selection.selections()
    }

    /// Signal events not yet handled: queued plus waiting in a debounce window.
    #[must_use]
    pub fn pending_signals(&self) -> usize {
        self.selection.pending_signals()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock
    }

    /// Mounts the component with its first props.
    pub fn initialize(&mut self, props: ChartProps) -> ChartResult<RenderPass> {
        self.teardown();
        self.update(props)
    }

    /// Renders `props`, either rebuilding the view or patching its data.
    ///
    /// A failure disposes the view and is captured and returned; later
    /// updates that leave every view-shaping input untouched return
    /// [`RenderPass::ErrorRetained`] without touching the engine.
    pub fn update(&mut self, props: ChartProps) -> ChartResult<RenderPass> {
        self.selection.set_fragment_id(props.fragment_id.as_deref());

        let reason = match self.props.as_ref() {
            None => Some(RecreateReason::NoView),
            Some(prev) => recreation_reason(prev, &props),
        };

        if reason.is_none() && self.error.is_some() {
            self.props = Some(props);
            return Ok(RenderPass::ErrorRetained);
        }

        let reason = reason.or_else(|| (!self.slot.is_live()).then_some(RecreateReason::NoView));
        let result = match reason {
            Some(reason) => {
                debug!(?reason, "recreating chart view");
                self.error = None;
                self.create_view(&props).map(|()| RenderPass::Created(reason))
            }
            None => self.patch_view(&props).map(|()| RenderPass::DataPatched),
        };
        self.props = Some(props);

        result.inspect_err(|err| {
            warn!(error = %err, "chart render failed");
            self.slot.dispose();
            self.error = Some(err.clone());
        })
    }

    /// Moves the host clock forward and handles every selection whose
    /// debounce window elapsed.
    ///
    /// Returns the number of handled selections.
    pub fn advance_time(&mut self, elapsed: Duration) -> ChartResult<usize> {
        self.clock += elapsed;
        self.selection
            .pump(self.slot.view(), self.slot.generation(), self.clock)
    }

    /// Clears the selection state and writes an empty selection to the store.
    pub fn reset_selections(&mut self) -> ChartResult<bool> {
        self.selection.reset()
    }

    /// Disposes the live view and forgets all component state.
    pub fn teardown(&mut self) {
        self.selection.detach();
        self.slot.dispose();
        self.props = None;
        self.error = None;
    }

    fn create_view(&mut self, props: &ChartProps) -> ChartResult<()> {
        self.slot.dispose();

        let spec = self.spec_builder.build_for(props)?;
        let created = self
            .engine
            .create(props.container(), &spec, &self.config.embed_options)
            .map_err(ChartError::ViewCreation)?;
        let generation = self.slot.install(created);

        self.slot
            .select_default_dataset_name(&props.element, &self.config.default_dataset_name);
        self.selection
            .attach(self.slot.view_mut()?, &props.element, generation)?;
        self.slot.insert_initial_data(&props.element)?;
        self.slot.initial_render()
    }

    fn patch_view(&mut self, props: &ChartProps) -> ChartResult<()> {
        let Some(prev) = self.props.as_ref() else {
            return Err(ChartError::DataNotYetReady);
        };
        self.slot.patch_data(&prev.element, &props.element)
    }
}

impl<E: RenderEngine, S: WidgetStateStore + 'static> Drop for ChartView<E, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{ChartView, RenderPass};
    use crate::api::{ChartSyncConfig, RecreateReason};
    use crate::core::{ChartElement, ChartProps, ChartTheme};
    use crate::extensions::MemoryWidgetStore;
    use crate::render::HeadlessEngine;

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let store = Rc::new(RefCell::new(MemoryWidgetStore::new()));
        let config = ChartSyncConfig::default().with_debounce_window_ms(0);
        assert!(ChartView::new(HeadlessEngine::new(), store, config).is_err());
    }

    #[test]
    fn first_update_creates_the_view() {
        let store = Rc::new(RefCell::new(MemoryWidgetStore::new()));
        let engine = HeadlessEngine::new();
        let mut view =
            ChartView::new(engine.clone(), store, ChartSyncConfig::default()).expect("view");

        let props = ChartProps::new(ChartElement::new(r#"{"mark": "bar"}"#), ChartTheme::light(), 300);
        assert_eq!(
            view.update(props).expect("render"),
            RenderPass::Created(RecreateReason::NoView)
        );
        assert_eq!(engine.created_count(), 1);
        assert_eq!(view.generation(), 1);

        drop(view);
        assert_eq!(engine.live_view_count(), 0);
    }
}
