//! Error types for pipeline-tickets
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! is [`TicketsError`]. The binary turns these into user-facing messages
//! through [`TicketsError::user_message`] and [`TicketsError::suggestions`].

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, TicketsError>;

/// Errors raised by the ticket pipeline
#[derive(Error, Debug)]
pub enum TicketsError {
    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Terminal prompt failure
    #[error("Prompt error: {0}")]
    Dialog(#[from] dialoguer::Error),

    /// A trace chain had no frames
    #[error("Traceback is empty")]
    EmptyTraceback,

    /// The remote store rejected or failed a request
    #[error("Ticket store error during {operation}: {message}")]
    Store { operation: String, message: String },

    /// A record was requested that the store does not hold
    #[error("{kind} #{id} not found")]
    RecordNotFound { kind: String, id: i64 },

    /// A store record could not be mapped onto a ticket
    #[error("Invalid {kind} record: {message}")]
    InvalidRecord { kind: String, message: String },

    /// Neither configuration nor context yields a project
    #[error("No project could be resolved for the ticket")]
    MissingProject,

    /// The host's exception-hook slot could not be read or written
    #[error("Exception hook slot error: {0}")]
    HookSlot(String),

    /// A user policy hook failed
    #[error("Policy hook '{hook}' failed: {message}")]
    Policy { hook: String, message: String },

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Anything else
    #[error("{0}")]
    Custom(String),
}

impl TicketsError {
    /// Create a custom error
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a store error for the given operation
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a policy hook error
    pub fn policy(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Policy {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Store { operation, message } => {
                format!("Failed to {operation} in the ticket store: {message}")
            },
            Self::MissingProject => {
                "This ticket has no project. Set `project_id` or work inside a project context."
                    .to_string()
            },
            Self::HookSlot(msg) => format!("Could not install the exception hook: {msg}"),
            _ => self.to_string(),
        }
    }

    /// Get suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(_) => vec![
                "Check the syntax of tickets.yaml".to_string(),
                "Environment overrides use the TICKETS_ prefix".to_string(),
            ],
            Self::MissingProject => vec![
                "Add `project_id: <id>` to tickets.yaml".to_string(),
                "Pass --project-id on the command line".to_string(),
            ],
            Self::RecordNotFound { .. } => {
                vec!["Check the ticket id with `pipeline-tickets show <id>`".to_string()]
            },
            Self::Store { .. } => vec!["Check that the store directory is writable".to_string()],
            _ => vec![],
        }
    }

    /// Check if the error is recoverable by retrying
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Io(_))
    }

    /// Check if the error comes from configuration
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::MissingProject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_message() {
        let err = TicketsError::store("create Ticket", "connection refused");
        assert_eq!(
            err.user_message(),
            "Failed to create Ticket in the ticket store: connection refused"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_project_suggestions() {
        let err = TicketsError::MissingProject;
        assert!(err.is_config_error());
        assert_eq!(err.suggestions().len(), 2);
    }
}
