mod chart_view;
mod data_reconciler;
mod json_helpers;
mod selection_sync;
mod spec_builder;
mod sync_config;
mod view_lifecycle;

pub use chart_view::{ChartView, RenderPass};
pub use data_reconciler::{DataAction, data_is_append_of_prev, reconcile};
#[cfg(feature = "parallel-diff")]
pub use data_reconciler::PARALLEL_DIFF_MIN_ROWS;
pub use selection_sync::{
    SELECTION_STORE_SUFFIX, SelectionSynchronizer, VIEW_STATE_KEY, normalize_selection,
};
pub use spec_builder::{RESERVED_DATASETS_KEY, SpecBuilder, SpecSizing};
pub use sync_config::{
    BOTTOM_PADDING_PX, ChartSyncConfig, DEFAULT_DATASET_NAME, DEFAULT_DEBOUNCE_WINDOW_MS,
};
pub use view_lifecycle::{LifecyclePhase, RecreateReason, ViewSlot, recreation_reason};
