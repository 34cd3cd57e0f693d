//! Handler for the `show` command

use super::base::HandlerContext;
use crate::error::Result;

/// Show a ticket from the local store
pub fn handle_show(id: i64, ctx: &HandlerContext) -> Result<()> {
    let ticket = ctx.load_ticket(id)?;
    ctx.formatter.ticket(&ticket, &ctx.app.ticket_url(ticket.id))
}
