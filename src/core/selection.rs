use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChartError, ChartResult};

/// Component-local selection state: selector name -> selected-points payload.
///
/// Serialized as `{"select": {...}}`, the shape the widget-state store and
/// its consumers expect. Selectors keep their first-insertion order so equal
/// states always serialize to equal strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub select: IndexMap<String, Value>,
}

impl SelectionState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.select.is_empty()
    }

    #[must_use]
    pub fn get(&self, selector: &str) -> Option<&Value> {
        self.select.get(selector)
    }

    /// Stores `payload` for `selector`, keeping every other selector's value.
    pub fn set(&mut self, selector: impl Into<String>, payload: Value) {
        self.select.insert(selector.into(), payload);
    }

    pub fn clear(&mut self) {
        self.select.clear();
    }

    pub fn to_store_string(&self) -> ChartResult<String> {
        serde_json::to_string(self).map_err(|e| {
            ChartError::Serialization(format!("failed to serialize selection state: {e}"))
        })
    }

    pub fn from_store_str(input: &str) -> ChartResult<Self> {
        serde_json::from_str(input).map_err(|e| {
            ChartError::Serialization(format!("failed to parse selection state: {e}"))
        })
    }
}
