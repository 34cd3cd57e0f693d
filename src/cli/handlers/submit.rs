//! Handler for the `submit` command

use super::base::HandlerContext;
use crate::core::TicketFieldsBuilder;
use crate::error::{Result, TicketsError};
use crate::interactive::{
    FormAnswers, SubmissionDialog, SubmissionRequest, TerminalSubmitter, default_priority,
    find_value, report_submission, submit_answers,
};
use std::path::PathBuf;

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct SubmitArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ticket_type: Option<String>,
    pub priority: Option<String>,
    pub attach: Vec<PathBuf>,
}

/// Submit a ticket
///
/// With both a title and a description the ticket is filed directly,
/// otherwise the submission form is opened pre-filled with the given
/// values.
pub fn handle_submit(args: SubmitArgs, ctx: &HandlerContext) -> Result<()> {
    let app = ctx.app.as_ref();
    let request = SubmissionRequest {
        fields: TicketFieldsBuilder::new()
            .title(args.title.clone().unwrap_or_default())
            .assignee(ctx.settings.default_assignee.clone())
            .build(),
        context: app.context(),
        ..SubmissionRequest::default()
    };

    let (Some(title), Some(description)) = (args.title, args.description.clone()) else {
        if ctx.formatter.is_json() || !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            return Err(TicketsError::InvalidInput(
                "--title and --description are required when not running in a terminal"
                    .to_string(),
            ));
        }
        let mut request = request;
        request.fields.description = args.description;
        request.fields.ticket_type = args.ticket_type;
        request.fields.priority = args.priority;
        return match TerminalSubmitter::new().submit(app, request)? {
            Some(_) => Ok(()),
            None => {
                ctx.info("Submission cancelled");
                Ok(())
            },
        };
    };

    // Given list values must be valid; the priority falls back to the last one
    let types = app.io().type_values()?;
    let ticket_type = match args.ticket_type.as_deref() {
        Some(given) => Some(
            find_value(&types, Some(given))
                .map(|i| types[i].clone())
                .ok_or_else(|| invalid_value("type", given, &types))?,
        ),
        None => None,
    };
    let priorities = app.io().priority_values()?;
    let priority = match args.priority.as_deref() {
        Some(given) => find_value(&priorities, Some(given))
            .map(|i| priorities[i].clone())
            .ok_or_else(|| invalid_value("priority", given, &priorities))?,
        None => default_priority(&priorities, None)
            .map(|i| priorities[i].clone())
            .unwrap_or_default(),
    };

    let answers = FormAnswers {
        title,
        ticket_type,
        priority: Some(priority).filter(|p| !p.is_empty()),
        description,
        attachments: args.attach,
    };

    let result = submit_answers(app, &request, answers);
    if ctx.formatter.is_json() {
        let ticket = result?;
        return ctx.formatter.print_json(&serde_json::json!({
            "status": "success",
            "ticket": ticket,
            "url": app.ticket_url(ticket.id),
        }));
    }
    report_submission(app, &result);
    result.map(|_| ())
}

fn invalid_value(field: &str, given: &str, valid: &[String]) -> TicketsError {
    TicketsError::InvalidInput(format!(
        "Invalid {field} '{given}'. Must be one of: {}",
        valid.join(", ")
    ))
}
