//! Debouncing and latest-wins scheduling of document analyses

mod debounce;
mod queue;

pub use debounce::{Debouncer, KeyedDebouncer, DEFAULT_DEBOUNCE};
pub use queue::{Admitted, DiagnosticQueue, QueueOutcome};
