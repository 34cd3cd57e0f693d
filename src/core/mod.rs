//! Core data types: tickets, entity references and pipeline contexts

mod builders;
mod context;
mod ticket;

pub use builders::TicketFieldsBuilder;
pub use context::{CONTEXT_KEYS, ExecutionContext, PipelineContext};
pub use ticket::{EntityRef, TICKET_KIND, Ticket, TicketFields};
