//! Access to the ticket tracking store

mod file;
mod io;
mod repository;

pub use file::{FileStore, SchemaValues};
pub use io::{
    ATTACHMENTS_FIELD, CONTEXT_FIELD, COUNT_FIELD, ERROR_FIELD, PRIORITY_FIELD, TYPE_FIELD,
    TicketsIo, record_to_ticket,
};
pub use repository::{Filter, Record, Relation, TicketStore};

#[cfg(test)]
pub use repository::MockTicketStore;
