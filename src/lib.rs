//! chart-sync: view reconciliation and selection synchronization for
//! declarative charts embedded in host UIs.
//!
//! A [`ChartView`] turns a chart element (spec text, columnar datasets,
//! selection modes) into a live rendering-engine view, patches datasets
//! incrementally across renders and mirrors interactive selections into an
//! external widget-state store.

pub mod api;
pub mod core;
pub mod error;
pub mod extensions;
pub mod interaction;
pub mod render;
pub mod telemetry;

pub use api::{ChartSyncConfig, ChartView, RenderPass};
pub use error::{ChartError, ChartResult, EngineError};
