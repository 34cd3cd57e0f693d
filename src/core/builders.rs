use super::{EntityRef, TicketFields};
use std::collections::BTreeMap;

/// Builder for creating [`TicketFields`] instances
#[derive(Default)]
pub struct TicketFieldsBuilder {
    title: Option<String>,
    ticket_type: Option<String>,
    priority: Option<String>,
    description: Option<String>,
    assignee: Option<EntityRef>,
    project: Option<EntityRef>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl TicketFieldsBuilder {
    /// Create a new fields builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the ticket type
    #[must_use]
    pub fn ticket_type(mut self, ticket_type: impl Into<String>) -> Self {
        self.ticket_type = Some(ticket_type.into());
        self
    }

    /// Set the priority
    #[must_use]
    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the assignee if one is given
    #[must_use]
    pub fn assignee(mut self, assignee: Option<EntityRef>) -> Self {
        self.assignee = assignee;
        self
    }

    /// Set the owning project
    #[must_use]
    pub fn project(mut self, project: EntityRef) -> Self {
        self.project = Some(project);
        self
    }

    /// Add a site-specific field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Build the fields
    pub fn build(self) -> TicketFields {
        TicketFields {
            title: self.title.unwrap_or_default(),
            ticket_type: self.ticket_type,
            priority: self.priority,
            description: self.description,
            error: None,
            context: None,
            assignee: self.assignee,
            project: self.project,
            extra: self.extra,
        }
    }
}
