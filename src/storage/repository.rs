use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A record as exchanged with the store: field name to value
pub type Record = serde_json::Map<String, Value>;

/// Comparison applied by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Is,
    IsNot,
}

/// A single `field relation value` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub relation: Relation,
    pub value: Value,
}

impl Filter {
    /// `field is value`
    pub fn is(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            relation: Relation::Is,
            value: value.into(),
        }
    }

    /// Does the record satisfy this condition?
    ///
    /// Comparison is exact; a missing field compares as null.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        match self.relation {
            Relation::Is => actual == &self.value,
            Relation::IsNot => actual != &self.value,
        }
    }
}

/// Record-oriented interface to the remote tracking store
///
/// Implementations own transport concerns such as retries and timeouts;
/// callers treat every error as final.
#[cfg_attr(test, mockall::automock)]
pub trait TicketStore: Send + Sync {
    /// Find the first record of `kind` matching all filters
    fn find_one(&self, kind: &str, filters: &[Filter], fields: &[String]) -> Result<Option<Record>>;

    /// Create a record and return it with at least `return_fields` populated
    fn create(&self, kind: &str, data: Record, return_fields: &[String]) -> Result<Record>;

    /// Update fields of an existing record
    fn update(&self, kind: &str, id: i64, data: Record) -> Result<Record>;

    /// Upload a file into a field of an existing record
    fn upload(&self, kind: &str, id: i64, path: &Path, field_name: &str) -> Result<()>;

    /// Valid values of a list field
    fn read_schema(&self, kind: &str, field: &str) -> Result<Vec<String>>;
}
