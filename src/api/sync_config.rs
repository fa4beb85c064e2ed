use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::render::EmbedOptions;

/// Settle window for selection signals.
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 150;

/// Minimum bottom padding that keeps x-axis labels from being cropped.
pub const BOTTOM_PADDING_PX: u32 = 20;

/// Dataset the primary inline data goes to when the element has no
/// named datasets.
pub const DEFAULT_DATASET_NAME: &str = "source";

/// Public component configuration.
///
/// Serializable so hosts can ship it alongside their own settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSyncConfig {
    #[serde(default = "default_debounce_window_ms")]
    pub debounce_window_ms: u64,
    #[serde(default = "default_bottom_padding_px")]
    pub bottom_padding_px: u32,
    #[serde(default = "default_dataset_name")]
    pub default_dataset_name: String,
    #[serde(default)]
    pub embed_options: EmbedOptions,
}

impl Default for ChartSyncConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: default_debounce_window_ms(),
            bottom_padding_px: default_bottom_padding_px(),
            default_dataset_name: default_dataset_name(),
            embed_options: EmbedOptions::default(),
        }
    }
}

impl ChartSyncConfig {
    #[must_use]
    pub fn with_debounce_window_ms(mut self, window_ms: u64) -> Self {
        self.debounce_window_ms = window_ms;
        self
    }

    #[must_use]
    pub fn with_bottom_padding_px(mut self, padding_px: u32) -> Self {
        self.bottom_padding_px = padding_px;
        self
    }

    #[must_use]
    pub fn with_default_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.default_dataset_name = name.into();
        self
    }

    #[must_use]
    pub fn with_embed_options(mut self, options: EmbedOptions) -> Self {
        self.embed_options = options;
        self
    }

    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.debounce_window_ms == 0 {
            return Err(ChartError::InvalidData(
                "debounce window must be > 0 ms".to_owned(),
            ));
        }
        if self.default_dataset_name.trim().is_empty() {
            return Err(ChartError::InvalidData(
                "default dataset name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::Serialization(format!("failed to serialize config: {e}")))
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ChartError::Serialization(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_debounce_window_ms() -> u64 {
    DEFAULT_DEBOUNCE_WINDOW_MS
}

fn default_bottom_padding_px() -> u32 {
    BOTTOM_PADDING_PX
}

fn default_dataset_name() -> String {
    DEFAULT_DATASET_NAME.to_owned()
}
