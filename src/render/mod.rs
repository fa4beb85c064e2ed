mod headless;

pub use headless::{HeadlessEngine, HeadlessView, ViewOperation};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ContainerRect, DataRow};
use crate::error::EngineError;

/// Callback attached to a named view signal; receives `(signal_name, value)`.
pub type SignalListener = Box<dyn FnMut(&str, &Value)>;

/// Options forwarded to the rendering engine on view construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedOptions {
    /// Evaluate expressions through the AST interpreter instead of code generation.
    pub ast: bool,
    /// Skip injecting the engine's default tooltip styles.
    pub disable_default_tooltip_style: bool,
    /// Inject the engine's default container styles.
    pub default_style: bool,
    pub force_actions_menu: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            ast: true,
            disable_default_tooltip_style: true,
            default_style: false,
            force_actions_menu: true,
        }
    }
}

/// Restricts an interaction-state snapshot to selected data entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateFilter {
    pub data: Vec<String>,
    /// Include state from nested sub-contexts.
    pub recurse: bool,
}

impl StateFilter {
    #[must_use]
    pub fn includes_data(&self, name: &str) -> bool {
        self.data.iter().any(|candidate| candidate == name)
    }
}

/// Result of a successful view construction.
pub struct CreatedView<V> {
    pub view: V,
    pub compiled_spec: Value,
    /// Releases engine resources; invoked exactly once by the owner.
    pub finalize: Box<dyn FnOnce()>,
}

/// Contract implemented by the rendering engine that compiles specs into views.
pub trait RenderEngine {
    type View: RenderView;

    /// Compiles `spec` and binds the resulting view to `container`.
    ///
    /// Returns once compilation succeeded.
    fn create(
        &mut self,
        container: ContainerRect,
        spec: &Value,
        options: &EmbedOptions,
    ) -> Result<CreatedView<Self::View>, EngineError>;
}

/// Imperative primitives of a live rendering view.
pub trait RenderView {
    /// Fails when `name` is not a dataset of this view.
    fn check_data(&self, name: &str) -> Result<(), EngineError>;
    fn insert(&mut self, name: &str, rows: Vec<DataRow>) -> Result<(), EngineError>;
    fn remove_all(&mut self, name: &str) -> Result<(), EngineError>;
    /// Clears `name` and inserts `rows` in one change set.
    fn replace(&mut self, name: &str, rows: Vec<DataRow>) -> Result<(), EngineError>;
    fn get_state(&self, filter: &StateFilter) -> Option<Value>;
    fn set_state(&mut self, state: &Value) -> Result<(), EngineError>;
    fn add_signal_listener(
        &mut self,
        signal: &str,
        listener: SignalListener,
    ) -> Result<(), EngineError>;
    fn resize(&mut self);
    /// Runs the view's pending dataflow and render pass.
    fn run(&mut self) -> Result<(), EngineError>;
}
