//! Ticket composition: the entry points for filing tickets
//!
//! [`TicketsApp`] ties the store, settings, policy hooks and the optional
//! submission dialog together. Tickets are filed either from an exception
//! ([`TicketsApp::create_exception_ticket`]) or from arbitrary fields
//! ([`TicketsApp::create_ticket`]).

use crate::config::Settings;
use crate::core::{
    EntityRef, ExecutionContext, PipelineContext, Ticket, TicketFields, TicketFieldsBuilder,
};
use crate::dedup::DeduplicationEngine;
use crate::error::{Result, TicketsError};
use crate::hooks::{DefaultEventsHook, EventsHook};
use crate::interactive::{SubmissionDialog, SubmissionRequest};
use crate::storage::{TicketStore, TicketsIo};
use crate::trace::{ExceptionInfo, TracebackInspector};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Type given to tickets filed from unhandled exceptions
pub const EXCEPTION_TICKET_TYPE: &str = "Bug";
/// Priority given to tickets filed from unhandled exceptions
pub const EXCEPTION_TICKET_PRIORITY: &str = "3";

const EXCEPTION_MESSAGE: &str = "Unhandled Exception! Please write a brief description of what \
                                 you were doing and submit a Ticket.";

/// Title of a ticket filed for an unhandled exception
pub fn exception_title(exc: &ExceptionInfo) -> String {
    format!("[unhandled] {} - {} ", exc.type_name(), exc.message())
}

/// Files tickets into the tracking store
pub struct TicketsApp {
    settings: Settings,
    io: TicketsIo,
    inspector: TracebackInspector,
    hooks: Arc<dyn EventsHook>,
    dialog: Option<Arc<dyn SubmissionDialog>>,
    context: RwLock<PipelineContext>,
}

impl std::fmt::Debug for TicketsApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketsApp")
            .field("settings", &self.settings)
            .field("io", &self.io)
            .field("hooks", &"Arc<dyn EventsHook>")
            .field("dialog", &self.dialog.is_some())
            .finish()
    }
}

impl TicketsApp {
    /// Create an app with the stock policy hooks and no dialog
    pub fn new(settings: Settings, store: Arc<dyn TicketStore>) -> Self {
        let inspector = TracebackInspector::new(settings.package_markers.clone());
        Self {
            settings,
            io: TicketsIo::new(store),
            inspector,
            hooks: Arc::new(DefaultEventsHook),
            dialog: None,
            context: RwLock::new(PipelineContext::default()),
        }
    }

    /// Replace the policy hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn EventsHook>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Register the dialog used when a ticket needs confirmation
    #[must_use]
    pub fn with_dialog(mut self, dialog: Arc<dyn SubmissionDialog>) -> Self {
        self.dialog = Some(dialog);
        self
    }

    /// Set the initial pipeline context
    #[must_use]
    pub fn with_context(self, context: PipelineContext) -> Self {
        self.set_context(context);
        self
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn io(&self) -> &TicketsIo {
        &self.io
    }

    pub const fn inspector(&self) -> &TracebackInspector {
        &self.inspector
    }

    /// The current pipeline context
    pub fn context(&self) -> PipelineContext {
        self.context
            .read()
            .map(|ctx| ctx.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Switch the current pipeline context
    pub fn set_context(&self, context: PipelineContext) {
        match self.context.write() {
            Ok(mut ctx) => *ctx = context,
            Err(poisoned) => *poisoned.into_inner() = context,
        }
    }

    /// Link to a ticket in the tracker's web UI
    pub fn ticket_url(&self, ticket_id: i64) -> String {
        format!("{}/detail/Ticket/{}", self.settings.base_url, ticket_id)
    }

    /// Value written to a text field, wrapped when `preformat_fields` is on
    fn field_text(&self, text: &str) -> String {
        if self.settings.preformat_fields {
            format!("```\n{text}\n```")
        } else {
            text.to_string()
        }
    }

    /// File a ticket for an exception
    ///
    /// Returns `None` when the `exception_filter` hook rejects the exception
    /// or the user cancels the dialog, and the existing ticket (with its
    /// count bumped) when the same error was filed before.
    pub fn create_exception_ticket(
        &self,
        exc: &ExceptionInfo,
        confirm: bool,
    ) -> Result<Option<Ticket>> {
        if !self.hooks.exception_filter(self, exc)? {
            debug!("Exception filtered out: {}", exc.type_name());
            return Ok(None);
        }

        let error = exc.format();
        let dedup = DeduplicationEngine::new(&self.io);
        if let Some(ticket) = dedup.find_or_increment(&self.field_text(&error))? {
            return Ok(Some(ticket));
        }

        let fields = TicketFieldsBuilder::new()
            .title(exception_title(exc))
            .ticket_type(EXCEPTION_TICKET_TYPE)
            .priority(EXCEPTION_TICKET_PRIORITY)
            .assignee(self.settings.default_assignee.clone())
            .build();

        if confirm {
            if let Some(dialog) = &self.dialog {
                let request = SubmissionRequest {
                    fields,
                    error: Some(error),
                    context: self.context(),
                    exc: Some(exc.clone()),
                    message: Some(EXCEPTION_MESSAGE.to_string()),
                };
                return dialog.submit(self, request);
            }
            info!("No submission dialog registered, filing ticket without confirmation");
        }

        let context = self.context();
        self.create_ticket(fields, Some(&context), &[], Some(error), Some(exc))
            .map(Some)
    }

    /// Create a ticket
    ///
    /// `context` defaults to the current pipeline context. With an exception
    /// its diagnostics are added to the context, and its formatted trace is
    /// used when no `error` is given. Attachments are uploaded after
    /// creation; an upload failure is returned but the ticket stays.
    pub fn create_ticket(
        &self,
        fields: TicketFields,
        context: Option<&PipelineContext>,
        attachments: &[PathBuf],
        error: Option<String>,
        exc: Option<&ExceptionInfo>,
    ) -> Result<Ticket> {
        let mut fields = fields;
        let mut error = error;
        let mut snapshot = match context {
            Some(ctx) => ExecutionContext::capture(ctx),
            None => ExecutionContext::capture(&self.context()),
        };

        if let Some(exc) = exc {
            match self.inspector.extract_details(exc) {
                Ok(details) => snapshot.extend(details.context_entries()),
                Err(e) => debug!("No traceback details: {}", e),
            }
            if error.is_none() {
                error = Some(exc.format());
            }
        }

        if fields.project.is_none() {
            fields.project = Some(self.resolve_project(&snapshot)?);
        }

        let (mut fields, snapshot, error) =
            self.hooks
                .before_create_ticket(self, fields, snapshot, error, exc)?;

        fields.context = Some(self.field_text(&snapshot.render()));
        fields.error = error.as_deref().map(|e| self.field_text(e));

        let ticket = self.io.create(&fields)?;
        info!("Created Ticket #{}", ticket.id);

        if !attachments.is_empty() {
            self.io.upload_attachments(ticket.id, attachments)?;
        }

        if let Err(e) = self.hooks.after_create_ticket(self, &ticket) {
            warn!("after_create_ticket hook failed: {}", e);
        }
        Ok(ticket)
    }

    fn resolve_project(&self, snapshot: &ExecutionContext) -> Result<EntityRef> {
        if let Some(id) = self.settings.project_override() {
            return Ok(EntityRef::project(id));
        }
        snapshot
            .project_id()
            .map(EntityRef::project)
            .ok_or(TicketsError::MissingProject)
    }
}
