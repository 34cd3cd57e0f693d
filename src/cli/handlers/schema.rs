//! Handler for the `schema` command

use super::base::HandlerContext;
use crate::error::Result;

/// Print the valid ticket types and priorities
pub fn handle_schema(ctx: &HandlerContext) -> Result<()> {
    let types = ctx.app.io().type_values()?;
    let priorities = ctx.app.io().priority_values()?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&serde_json::json!({
            "types": types,
            "priorities": priorities,
        }));
    }

    ctx.info(&format!("Types: {}", types.join(", ")));
    ctx.info(&format!("Priorities: {}", priorities.join(", ")));
    Ok(())
}
