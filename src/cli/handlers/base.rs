//! Base handler utilities for common operations
//!
//! Every command loads the settings, opens the local store and builds a
//! [`TicketsApp`] the same way; [`HandlerContext`] does that once.

use crate::app::TicketsApp;
use crate::cli::output::OutputFormatter;
use crate::config::Settings;
use crate::core::{EntityRef, PipelineContext, TICKET_KIND, Ticket};
use crate::error::Result;
use crate::interactive::TerminalSubmitter;
use crate::storage::{FileStore, record_to_ticket};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub project_id: Option<i64>,
}

/// Context for handler operations
pub struct HandlerContext {
    pub settings: Settings,
    pub store: Arc<FileStore>,
    pub app: Arc<TicketsApp>,
    pub formatter: OutputFormatter,
}

impl HandlerContext {
    /// Load settings, apply command-line overrides and open the store
    ///
    /// The submission form is only registered when stdin is a terminal.
    pub fn new(options: &GlobalOptions, formatter: OutputFormatter) -> Result<Self> {
        let mut settings = Settings::load(options.config.as_deref())?;
        if let Some(store) = &options.store {
            settings.store_dir = Some(store.clone());
        }
        if options.project_id.is_some() {
            settings.project_id = options.project_id;
        }

        let store_dir = settings.store_dir();
        debug!("Using ticket store at {}", store_dir.display());
        let store = Arc::new(FileStore::new(store_dir, settings.schema.values()));

        let context = PipelineContext {
            project: settings.project_override().map(EntityRef::project),
            shotgun_url: Some(settings.base_url.clone()),
            ..PipelineContext::default()
        };
        let mut app = TicketsApp::new(settings.clone(), store.clone()).with_context(context);
        if std::io::stdin().is_terminal() && !formatter.is_json() {
            app = app.with_dialog(Arc::new(TerminalSubmitter::new()));
        }

        Ok(Self {
            settings,
            store,
            app: Arc::new(app),
            formatter,
        })
    }

    pub fn store_root(&self) -> &Path {
        self.store.root()
    }

    /// Load a ticket from the local store
    pub fn load_ticket(&self, id: i64) -> Result<Ticket> {
        record_to_ticket(self.store.load(TICKET_KIND, id)?)
    }

    pub fn success(&self, message: &str) {
        self.formatter.success(message);
    }

    pub fn info(&self, message: &str) {
        self.formatter.info(message);
    }

    pub fn warning(&self, message: &str) {
        self.formatter.warning(message);
    }
}
