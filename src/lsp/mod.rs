//! Language Server Protocol host
//!
//! Publishes naming diagnostics for open JavaScript and TypeScript documents
//! and answers quick fix requests.

mod actions;
mod server;

pub use actions::{CodeActionProvider, RENAME_COMMAND};
pub use server::{run_server, NameLanguageServer};
