//! Diagnostics and quick fixes for violations

mod cache;
mod suggest;
mod synthesizer;

pub use cache::{FixCache, FixKey};
pub use suggest::{interpret_response, HttpSuggestionClient, SuggestionError, SuggestionService};
pub use synthesizer::{to_diagnostic, to_diagnostics, FixSynthesizer};
