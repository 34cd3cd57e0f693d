//! Pipeline context snapshots attached to tickets
//!
//! A [`PipelineContext`] describes where the artist is currently working.
//! Each ticket gets its own [`ExecutionContext`] snapshot of it, optionally
//! enriched with diagnostics from a trace, and rendered as text into the
//! ticket's context field.

use super::EntityRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys rendered first, in this order, in the context block
pub const CONTEXT_KEYS: [&str; 6] = ["project", "entity", "step", "task", "user", "shotgun_url"];

const CONTEXT_HEADER: &str = "Shotgun Context";
const ADDITIONAL_HEADER: &str = "Additional Context";

/// The host's current working context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineContext {
    #[serde(default)]
    pub project: Option<EntityRef>,
    #[serde(default)]
    pub entity: Option<EntityRef>,
    #[serde(default)]
    pub step: Option<EntityRef>,
    #[serde(default)]
    pub task: Option<EntityRef>,
    #[serde(default)]
    pub user: Option<EntityRef>,
    #[serde(default)]
    pub shotgun_url: Option<String>,
}

/// Snapshot of a [`PipelineContext`] plus any extra (diagnostic) keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    pub project: Option<EntityRef>,
    pub entity: Option<EntityRef>,
    pub step: Option<EntityRef>,
    pub task: Option<EntityRef>,
    pub user: Option<EntityRef>,
    pub shotgun_url: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl ExecutionContext {
    /// Capture a snapshot of the given pipeline context
    pub fn capture(context: &PipelineContext) -> Self {
        Self {
            project: context.project.clone(),
            entity: context.entity.clone(),
            step: context.step.clone(),
            task: context.task.clone(),
            user: context.user.clone(),
            shotgun_url: context.shotgun_url.clone(),
            extra: BTreeMap::new(),
        }
    }

    /// Add extra keys, replacing any with the same name
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// The project id of the snapshot, if it has one
    pub fn project_id(&self) -> Option<i64> {
        self.project.as_ref().map(|p| p.id)
    }

    fn core_value(&self, key: &str) -> Option<String> {
        match key {
            "project" => self.project.as_ref().map(ToString::to_string),
            "entity" => self.entity.as_ref().map(ToString::to_string),
            "step" => self.step.as_ref().map(ToString::to_string),
            "task" => self.task.as_ref().map(ToString::to_string),
            "user" => self.user.as_ref().map(ToString::to_string),
            "shotgun_url" => self.shotgun_url.clone(),
            _ => None,
        }
    }

    /// Render the snapshot as the human-readable context block
    ///
    /// Core keys come first in [`CONTEXT_KEYS`] order; extra keys follow,
    /// sorted, under a second header. Extra keys shadowing a core key are
    /// not repeated.
    pub fn render(&self) -> String {
        let mut lines = vec![CONTEXT_HEADER.to_string()];
        for key in CONTEXT_KEYS {
            let value = self.core_value(key).unwrap_or_else(|| "None".to_string());
            lines.push(format!("  {key}: {value}"));
        }

        let additional: Vec<_> = self
            .extra
            .iter()
            .filter(|(key, _)| !CONTEXT_KEYS.contains(&key.as_str()))
            .collect();
        if !additional.is_empty() {
            lines.push(ADDITIONAL_HEADER.to_string());
            for (key, value) in additional {
                lines.push(format!("  {key}: {value}"));
            }
        }

        lines.join("\n")
    }
}
