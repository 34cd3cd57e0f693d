//! Deduplication of exception tickets by exact error text

use crate::core::Ticket;
use crate::error::Result;
use crate::storage::{COUNT_FIELD, Record, TicketsIo};
use serde_json::Value;
use tracing::debug;

/// Finds an existing ticket for an error and bumps its occurrence count
#[derive(Debug)]
pub struct DeduplicationEngine<'a> {
    io: &'a TicketsIo,
}

impl<'a> DeduplicationEngine<'a> {
    pub const fn new(io: &'a TicketsIo) -> Self {
        Self { io }
    }

    /// Look up a ticket whose error field equals `error_text` byte for byte
    ///
    /// On a hit the ticket's count is incremented (a missing count counts as
    /// zero) and the updated ticket is returned. `None` means no ticket
    /// holds this error yet. Store errors are returned as-is.
    pub fn find_or_increment(&self, error_text: &str) -> Result<Option<Ticket>> {
        let Some(mut ticket) = self.io.find_matching_error(error_text)? else {
            return Ok(None);
        };

        debug!("Found matching Ticket #{}", ticket.id);
        let count = ticket.count.unwrap_or(0) + 1;
        let mut data = Record::new();
        data.insert(COUNT_FIELD.to_string(), Value::from(count));
        self.io.update(ticket.id, data)?;

        ticket.count = Some(count);
        Ok(Some(ticket))
    }
}
