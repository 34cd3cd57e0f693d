use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Entity kind of ticket records in the store
pub const TICKET_KIND: &str = "Ticket";

/// Reference to an entity in the tracking store (project, user, group, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    /// Create a reference without a display name
    pub fn new(entity_type: impl Into<String>, id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            name: None,
        }
    }

    /// Attach a display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Shorthand for a project reference
    pub fn project(id: i64) -> Self {
        Self::new("Project", id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} #{} ({})", self.entity_type, self.id, name),
            None => write!(f, "{} #{}", self.entity_type, self.id),
        }
    }
}

/// A ticket record as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "sg_ticket_type", default)]
    pub ticket_type: Option<String>,
    #[serde(rename = "sg_priority", default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "sg_error", default)]
    pub error: Option<String>,
    #[serde(rename = "sg_context", default)]
    pub context: Option<String>,
    #[serde(rename = "sg_count", default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub assignee: Option<EntityRef>,
    #[serde(default)]
    pub project: Option<EntityRef>,
}

/// Field data sent to the store when creating a ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketFields {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "sg_ticket_type", default, skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    #[serde(rename = "sg_priority", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "sg_error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "sg_context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<EntityRef>,
    /// Site-specific fields passed through to the store untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
