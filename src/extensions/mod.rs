//! Boundaries to the collaborators around the chart view: theming,
//! selection-spec preparation and the external widget-state store.

mod form_clear;
mod selection_prep;
mod theme;
mod widget_store;

pub use form_clear::FormClearHelper;
pub use selection_prep::{EncodingSelectionPreparer, SelectionSpecPreparer};
pub use theme::{CONTINUOUS_HEIGHT_PX, CONTINUOUS_WIDTH_PX, HostTheming, SpecTheming, merge_into};
pub use widget_store::{
    FormClearListener, ListenerId, MemoryWidgetStore, StringWrite, ValueSource, WidgetStateStore,
};
