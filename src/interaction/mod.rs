//! Event plumbing between view signals and the selection synchronizer.

mod debounce;
mod signal_inbox;

pub use debounce::{KeyedDebouncer, TrailingDebouncer};
pub use signal_inbox::{SignalEvent, SignalInbox};
