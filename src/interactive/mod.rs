//! Ticket submission form
//!
//! Exception tickets that need confirmation, and manual submissions, go
//! through a [`SubmissionDialog`]. [`TerminalSubmitter`] is the stock
//! implementation: a guided terminal form built on dialoguer.

use crate::app::TicketsApp;
use crate::core::{PipelineContext, Ticket, TicketFields};
use crate::error::{Result, TicketsError};
use crate::trace::ExceptionInfo;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::path::PathBuf;
use tracing::{error, info};

/// Everything a form is pre-populated with
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub fields: TicketFields,
    pub error: Option<String>,
    pub context: PipelineContext,
    pub exc: Option<ExceptionInfo>,
    /// Shown above the form, e.g. why it popped up
    pub message: Option<String>,
}

/// A form the user fills in to submit a ticket
pub trait SubmissionDialog: Send + Sync {
    /// Show the form and submit the ticket
    ///
    /// Returns `None` when the user cancels.
    fn submit(&self, app: &TicketsApp, request: SubmissionRequest) -> Result<Option<Ticket>>;
}

/// Values entered in the form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormAnswers {
    pub title: String,
    pub ticket_type: Option<String>,
    pub priority: Option<String>,
    pub description: String,
    pub attachments: Vec<PathBuf>,
}

impl FormAnswers {
    /// Title and description are required
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TicketsError::InvalidInput("Title required.".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(TicketsError::InvalidInput("Description required.".to_string()));
        }
        Ok(())
    }
}

/// Index of `given` in `values`, compared case-insensitively
pub fn find_value(values: &[String], given: Option<&str>) -> Option<usize> {
    let given = given?;
    values.iter().position(|v| v.eq_ignore_ascii_case(given))
}

/// Default priority: the given one if valid, else the last value
pub fn default_priority(values: &[String], given: Option<&str>) -> Option<usize> {
    find_value(values, given).or_else(|| values.len().checked_sub(1))
}

/// Split a comma separated list of attachment paths
pub fn parse_attachments(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Submit a filled-in form
///
/// Field values from the request that the form does not show (assignee,
/// project, site-specific fields) are kept.
pub fn submit_answers(
    app: &TicketsApp,
    request: &SubmissionRequest,
    answers: FormAnswers,
) -> Result<Ticket> {
    answers.validate()?;

    let mut fields = request.fields.clone();
    fields.title = answers.title;
    fields.description = Some(answers.description);
    fields.ticket_type = answers.ticket_type.or(fields.ticket_type);
    fields.priority = answers.priority.or(fields.priority);

    app.create_ticket(
        fields,
        Some(&request.context),
        &answers.attachments,
        request.error.clone(),
        request.exc.as_ref(),
    )
}

/// Print the result of a submission the way the form reports it
pub fn report_submission(app: &TicketsApp, result: &Result<Ticket>) {
    match result {
        Ok(ticket) => {
            println!("{}", format!("Your Ticket is #{}.", ticket.id).green().bold());
            println!("  {}", app.ticket_url(ticket.id).cyan());
        },
        Err(e) => {
            eprintln!("{}", "Failed to submit Ticket.".red().bold());
            eprintln!("{e:?}");
        },
    }
}

/// Guided terminal form
pub struct TerminalSubmitter {
    theme: ColorfulTheme,
}

impl Default for TerminalSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSubmitter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Ask for every field, starting from the request's values
    pub fn prompt(&self, app: &TicketsApp, request: &SubmissionRequest) -> Result<FormAnswers> {
        if let Some(message) = &request.message {
            println!("{}\n", message.yellow());
        }
        if let Some(error) = &request.error {
            println!("{}\n{}\n", "Error".bold(), error.dimmed());
        }

        let title = Input::<String>::with_theme(&self.theme)
            .with_prompt("Title")
            .with_initial_text(request.fields.title.clone())
            .validate_with(|input: &String| {
                if input.trim().is_empty() { Err("Title required.") } else { Ok(()) }
            })
            .interact_text()?;

        let types = app.io().type_values()?;
        let ticket_type = self.select(
            "Type",
            &types,
            find_value(&types, request.fields.ticket_type.as_deref()),
        )?;

        let priorities = app.io().priority_values()?;
        let priority = self.select(
            "Priority",
            &priorities,
            default_priority(&priorities, request.fields.priority.as_deref()),
        )?;

        let description = Input::<String>::with_theme(&self.theme)
            .with_prompt("Description")
            .with_initial_text(request.fields.description.clone().unwrap_or_default())
            .validate_with(|input: &String| {
                if input.trim().is_empty() { Err("Description required.") } else { Ok(()) }
            })
            .interact_text()?;

        let attachments = Input::<String>::with_theme(&self.theme)
            .with_prompt("Attachments (comma-separated paths, optional)")
            .allow_empty(true)
            .interact_text()?;

        Ok(FormAnswers {
            title,
            ticket_type,
            priority,
            description,
            attachments: parse_attachments(&attachments),
        })
    }

    fn select(
        &self,
        prompt: &str,
        values: &[String],
        default: Option<usize>,
    ) -> Result<Option<String>> {
        if values.is_empty() {
            return Ok(None);
        }
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(values)
            .default(default.unwrap_or(0))
            .interact()?;
        Ok(values.get(index).cloned())
    }
}

impl SubmissionDialog for TerminalSubmitter {
    fn submit(&self, app: &TicketsApp, request: SubmissionRequest) -> Result<Option<Ticket>> {
        info!("Launching tickets submitter...");
        let answers = self.prompt(app, &request)?;

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt("Submit Ticket?")
            .default(true)
            .interact()?;
        if !confirmed {
            return Ok(None);
        }

        let result = submit_answers(app, &request, answers);
        report_submission(app, &result);
        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(e) => {
                error!("Failed to submit Ticket: {}", e);
                Err(e)
            },
        }
    }
}
