//! Ticket-level operations on top of a [`TicketStore`]

use super::repository::{Filter, Record, TicketStore};
use crate::core::{TICKET_KIND, Ticket, TicketFields};
use crate::error::{Result, TicketsError};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const PRIORITY_FIELD: &str = "sg_priority";
pub const TYPE_FIELD: &str = "sg_ticket_type";
pub const ERROR_FIELD: &str = "sg_error";
pub const COUNT_FIELD: &str = "sg_count";
pub const CONTEXT_FIELD: &str = "sg_context";
pub const ATTACHMENTS_FIELD: &str = "attachments";

const CREATE_RETURN_FIELDS: [&str; 10] = [
    "title",
    "description",
    "created_by",
    "created_at",
    "project",
    CONTEXT_FIELD,
    ERROR_FIELD,
    TYPE_FIELD,
    PRIORITY_FIELD,
    "sg_status_list",
];

/// Typed access to tickets in the store
#[derive(Clone)]
pub struct TicketsIo {
    store: Arc<dyn TicketStore>,
}

impl std::fmt::Debug for TicketsIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketsIo")
            .field("store", &"Arc<dyn TicketStore>")
            .finish()
    }
}

impl TicketsIo {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn TicketStore {
        self.store.as_ref()
    }

    /// Valid ticket priorities
    pub fn priority_values(&self) -> Result<Vec<String>> {
        self.store.read_schema(TICKET_KIND, PRIORITY_FIELD)
    }

    /// Valid ticket types
    pub fn type_values(&self) -> Result<Vec<String>> {
        self.store.read_schema(TICKET_KIND, TYPE_FIELD)
    }

    /// Find a ticket whose error text is exactly `error`
    pub fn find_matching_error(&self, error: &str) -> Result<Option<Ticket>> {
        let filters = [Filter::is(ERROR_FIELD, error)];
        let fields = ["id".to_string(), COUNT_FIELD.to_string()];
        self.store
            .find_one(TICKET_KIND, &filters, &fields)?
            .map(record_to_ticket)
            .transpose()
    }

    /// Create a ticket from field data
    pub fn create(&self, fields: &TicketFields) -> Result<Ticket> {
        debug!("Creating new Ticket: {}", fields.title);
        let data = match serde_json::to_value(fields)? {
            Value::Object(map) => map,
            other => {
                return Err(TicketsError::InvalidRecord {
                    kind: TICKET_KIND.to_string(),
                    message: format!("fields serialized to {other}"),
                });
            },
        };
        let return_fields: Vec<String> = CREATE_RETURN_FIELDS.iter().map(ToString::to_string).collect();
        let record = self.store.create(TICKET_KIND, data, &return_fields)?;
        record_to_ticket(record)
    }

    /// Update fields of a ticket
    pub fn update(&self, ticket_id: i64, data: Record) -> Result<Record> {
        debug!("Updating Ticket #{}: {:?}", ticket_id, data);
        self.store.update(TICKET_KIND, ticket_id, data)
    }

    /// Upload files to a ticket one after the other
    ///
    /// Stops at the first failure; files uploaded before it stay attached.
    pub fn upload_attachments(&self, ticket_id: i64, attachments: &[PathBuf]) -> Result<()> {
        let total = attachments.len();
        for (i, attachment) in attachments.iter().enumerate() {
            debug!("Uploading attachment ({} of {})", i + 1, total);
            self.store
                .upload(TICKET_KIND, ticket_id, attachment, ATTACHMENTS_FIELD)?;
        }
        Ok(())
    }
}

/// Map a store record onto a [`Ticket`]
pub fn record_to_ticket(record: Record) -> Result<Ticket> {
    serde_json::from_value(Value::Object(record)).map_err(|e| TicketsError::InvalidRecord {
        kind: TICKET_KIND.to_string(),
        message: e.to_string(),
    })
}
