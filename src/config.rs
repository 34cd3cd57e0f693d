//! Settings for the ticket pipeline
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! YAML file, then `TICKETS_*` environment variables (`__` separates
//! nested keys, lists are comma separated).

use crate::core::{EntityRef, TICKET_KIND};
use crate::error::Result;
use crate::excepthook::HostKind;
use crate::hooks::CommandHooks;
use crate::storage::{PRIORITY_FIELD, SchemaValues, TYPE_FIELD};
use crate::trace::FilterPolicy;
use crate::trace::inspector::DEFAULT_PACKAGE_MARKERS;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tickets.yaml";

/// Settings recognised by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch for the exception hook
    pub excepthook_enabled: bool,
    /// Modules whose exceptions become tickets
    pub excepthook_includes: Vec<String>,
    /// Modules whose exceptions are always ignored
    pub excepthook_excludes: Vec<String>,
    /// Ask the user before filing exception tickets
    pub excepthook_confirm: bool,
    /// Host whose hook slot is patched
    pub host: HostKind,
    pub default_assignee: Option<EntityRef>,
    /// Overrides the context project when set to a non-negative id
    pub project_id: Option<i64>,
    /// Base URL used for ticket links
    pub base_url: String,
    /// Root of the local file store
    pub store_dir: Option<PathBuf>,
    /// Files marking a directory as a package when naming modules
    pub package_markers: Vec<String>,
    /// Wrap context and error text in a preformatted block
    pub preformat_fields: bool,
    /// Valid list values served by the file store
    pub schema: SchemaConfig,
    pub commands: CommandHooks,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            excepthook_enabled: true,
            excepthook_includes: Vec::new(),
            excepthook_excludes: Vec::new(),
            excepthook_confirm: true,
            host: HostKind::Generic,
            default_assignee: None,
            project_id: None,
            base_url: "https://localhost".to_string(),
            store_dir: None,
            package_markers: DEFAULT_PACKAGE_MARKERS.iter().map(ToString::to_string).collect(),
            preformat_fields: false,
            schema: SchemaConfig::default(),
            commands: CommandHooks::default(),
        }
    }
}

/// Valid values of the ticket list fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub ticket_types: Vec<String>,
    pub priorities: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            ticket_types: ["Bug", "Feature", "Question", "Support"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            priorities: ["1", "2", "3", "4", "5"].iter().map(ToString::to_string).collect(),
        }
    }
}

impl SchemaConfig {
    /// Values keyed the way the store reads them
    pub fn values(&self) -> SchemaValues {
        let mut ticket = BTreeMap::new();
        ticket.insert(TYPE_FIELD.to_string(), self.ticket_types.clone());
        ticket.insert(PRIORITY_FIELD.to_string(), self.priorities.clone());
        let mut schema = BTreeMap::new();
        schema.insert(TICKET_KIND.to_string(), ticket);
        schema
    }
}

impl Settings {
    /// Load settings from an explicit file (which must exist) or the
    /// default locations (which may be absent)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())?;
        let mut builder = Config::builder().add_source(defaults);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
            },
            None => {
                if let Some(dirs) = Self::project_dirs() {
                    builder = builder.add_source(
                        File::from(dirs.config_dir().join(CONFIG_FILE_NAME))
                            .format(FileFormat::Yaml)
                            .required(false),
                    );
                }
                builder = builder.add_source(
                    File::from(Path::new(CONFIG_FILE_NAME))
                        .format(FileFormat::Yaml)
                        .required(false),
                );
            },
        }

        let config = builder
            .add_source(
                Environment::with_prefix("TICKETS")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("excepthook_includes")
                    .with_list_parse_key("excepthook_excludes")
                    .with_list_parse_key("package_markers")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from default locations, falling back to defaults on error
    pub fn load_or_default() -> Self {
        Self::load(None).unwrap_or_else(|e| {
            tracing::warn!("Using default settings: {}", e);
            Self::default()
        })
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "pipeline-tickets")
    }

    /// Directory of the local file store
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("store"))
                .unwrap_or_else(|| PathBuf::from(".tickets"))
        })
    }

    /// The configured project override, if any
    ///
    /// Negative ids mean "unset".
    pub fn project_override(&self) -> Option<i64> {
        self.project_id.filter(|id| *id >= 0)
    }

    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy::new(
            self.excepthook_includes.clone(),
            self.excepthook_excludes.clone(),
        )
    }
}
