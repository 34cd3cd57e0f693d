//! Output formatting for the CLI
//!
//! Messages go to the terminal with colors unless disabled; in JSON mode
//! human-oriented messages are suppressed and results are printed as JSON.

use crate::core::Ticket;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Formats command output as colored text or JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || std::env::var_os("NO_COLOR").is_some() {
            colored::control::set_override(false);
        }
        Self { json }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {}", "✓".green().bold(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {}", "Warning:".yellow().bold(), message);
        }
    }

    /// Errors are printed in every mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    /// Print a value as JSON in JSON mode, do nothing otherwise
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            self.print_json(value)?;
        }
        Ok(())
    }

    /// Print a value as pretty JSON regardless of mode
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a ticket, as JSON or as a text block
    pub fn ticket(&self, ticket: &Ticket, url: &str) -> Result<()> {
        if self.json {
            let mut value = serde_json::to_value(ticket)?;
            value["url"] = serde_json::Value::from(url);
            return self.print_json(&value);
        }

        println!("{} {}", format!("Ticket #{}", ticket.id).bold(), ticket.title);
        if let Some(ticket_type) = &ticket.ticket_type {
            println!("  {}: {}", "Type".cyan(), ticket_type);
        }
        if let Some(priority) = &ticket.priority {
            println!("  {}: {}", "Priority".cyan(), priority);
        }
        if let Some(project) = &ticket.project {
            println!("  {}: {}", "Project".cyan(), project);
        }
        if let Some(assignee) = &ticket.assignee {
            println!("  {}: {}", "Assignee".cyan(), assignee);
        }
        if let Some(count) = ticket.count {
            println!("  {}: {}", "Count".cyan(), count);
        }
        println!("  {}: {}", "URL".cyan(), url);
        if let Some(description) = &ticket.description {
            println!("\n{description}");
        }
        if let Some(context) = &ticket.context {
            println!("\n{}", context.dimmed());
        }
        if let Some(error) = &ticket.error {
            println!("\n{}", error.red());
        }
        Ok(())
    }
}
