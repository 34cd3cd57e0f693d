//! Policy hooks users override to customise ticket creation
//!
//! [`EventsHook`] has three extension points: deciding whether an
//! unhandled exception deserves a ticket, augmenting a ticket before it is
//! created, and reacting once it exists. Every method has a default, so an
//! implementation only overrides what it needs. The defaults also run the
//! shell commands configured under `commands` in the settings.

use crate::app::TicketsApp;
use crate::core::{ExecutionContext, Ticket, TicketFields};
use crate::error::{Result, TicketsError};
use crate::trace::ExceptionInfo;
use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, error, warn};

/// Environment variable holding the ticket as JSON for command hooks
pub const TICKET_ENV: &str = "TICKETS_TICKET";
/// Environment variable naming the event for command hooks
pub const EVENT_ENV: &str = "TICKETS_EVENT";

/// User-overridable policy hooks
pub trait EventsHook: Send + Sync {
    /// Should a ticket be created for this unhandled exception?
    ///
    /// The default logs the exception and applies the configured
    /// include/exclude module patterns to the innermost frame.
    fn exception_filter(&self, app: &TicketsApp, exc: &ExceptionInfo) -> Result<bool> {
        error!("Unhandled Exception!");
        error!("{}", exc.format());

        let policy = app.settings().filter_policy();
        Ok(policy.is_important_traceback(exc.frames(), app.inspector()))
    }

    /// Augment a ticket's fields, context or error text before creation
    fn before_create_ticket(
        &self,
        _app: &TicketsApp,
        fields: TicketFields,
        context: ExecutionContext,
        error: Option<String>,
        _exc: Option<&ExceptionInfo>,
    ) -> Result<(TicketFields, ExecutionContext, Option<String>)> {
        Ok((fields, context, error))
    }

    /// Called with every newly created ticket
    fn after_create_ticket(&self, app: &TicketsApp, ticket: &Ticket) -> Result<()> {
        app.settings().commands.run_after_create(ticket)
    }
}

/// The stock hooks
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEventsHook;

impl EventsHook for DefaultEventsHook {}

/// A shell command run on a ticket event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHook {
    /// Hook name (for identification)
    pub name: String,
    /// Command to execute
    pub command: String,
    /// Whether the hook is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Shell commands configured per event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandHooks {
    pub after_create_ticket: Vec<CommandHook>,
}

impl CommandHooks {
    /// Run every enabled `after_create_ticket` command
    ///
    /// A failing command is logged and does not stop the others.
    pub fn run_after_create(&self, ticket: &Ticket) -> Result<()> {
        let hooks: Vec<_> = self.after_create_ticket.iter().filter(|h| h.enabled).collect();
        if hooks.is_empty() {
            return Ok(());
        }

        let ticket_json = serde_json::to_string(ticket)?;
        for hook in hooks {
            match execute_command(hook, "after_create_ticket", &ticket_json) {
                Ok(()) => debug!("Hook '{}' finished", hook.name),
                Err(e) => warn!("Hook '{}' failed: {}", hook.name, e),
            }
        }
        Ok(())
    }
}

/// Execute a single command hook
fn execute_command(hook: &CommandHook, event: &str, ticket_json: &str) -> Result<()> {
    let (shell, shell_arg) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let output = Command::new(shell)
        .arg(shell_arg)
        .arg(&hook.command)
        .env(TICKET_ENV, ticket_json)
        .env(EVENT_ENV, event)
        .output()
        .map_err(|e| TicketsError::policy(&hook.name, format!("Failed to execute: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TicketsError::policy(
            &hook.name,
            format!("Command failed: {}", stderr.trim()),
        ));
    }

    Ok(())
}
