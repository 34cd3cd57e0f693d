//! pipeline-tickets - support tickets for pipeline tools
//!
//! This crate lets artists file support tickets into a production tracking
//! store, and files tickets automatically for unhandled exceptions:
//! - Exception hook installation for the panic hook and GUI hosts, chaining
//!   to whatever hook was active before
//! - Diagnostic context extracted from stack traces
//! - Include/exclude module patterns deciding which exceptions matter
//! - Deduplication of repeated errors by exact error text
//! - Pluggable policy hooks and an optional confirmation form

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_self)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::single_match_else)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::too_many_lines)]

//! # Example
//!
//! ```rust,ignore
//! use pipeline_tickets::{ExceptHookManager, FileStore, Settings, TicketsApp};
//! use std::sync::Arc;
//!
//! let settings = Settings::load(None)?;
//! let store = Arc::new(FileStore::new(settings.store_dir(), settings.schema.values()));
//! let app = Arc::new(TicketsApp::new(settings, store));
//!
//! // Every panic from here on is chained to the previous hook and filed
//! let manager = ExceptHookManager::new(app);
//! manager.init()?;
//! // ...
//! manager.destroy()?;
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dedup;
pub mod error;
pub mod excepthook;
pub mod hooks;
pub mod interactive;
pub mod storage;
pub mod trace;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use app::TicketsApp;
pub use config::Settings;
pub use error::{Result, TicketsError};
pub use excepthook::{ExceptHookManager, HostKind};
pub use storage::{FileStore, TicketStore};
pub use trace::ExceptionInfo;
