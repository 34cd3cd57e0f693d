//! Handler for the `url` command

use super::base::HandlerContext;
use crate::error::Result;

/// Print the link to a ticket
pub fn handle_url(id: i64, ctx: &HandlerContext) -> Result<()> {
    let url = ctx.app.ticket_url(id);
    if ctx.formatter.is_json() {
        return ctx
            .formatter
            .print_json(&serde_json::json!({ "id": id, "url": url }));
    }
    ctx.info(&url);
    Ok(())
}
