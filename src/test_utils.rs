//! Test utilities for pipeline-tickets
//!
//! Common fixtures shared by the unit tests: an in-memory store, a sample
//! exception and a ready-to-use app.

#![cfg(test)]

use crate::app::TicketsApp;
use crate::config::{SchemaConfig, Settings};
use crate::core::{EntityRef, PipelineContext};
use crate::error::{Result, TicketsError};
use crate::storage::{Filter, Record, SchemaValues, TicketStore};
use crate::trace::{ExceptionInfo, Frame};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Project every test app works in
pub const TEST_PROJECT_ID: i64 = 65;

/// The stock ticket schema
pub fn ticket_schema() -> SchemaValues {
    SchemaConfig::default().values()
}

/// Default settings with every module considered important
pub fn include_all() -> Settings {
    Settings {
        excepthook_includes: vec!["*".to_string()],
        ..Settings::default()
    }
}

/// An exception raised two frames deep in a studio tool
pub fn zero_division() -> ExceptionInfo {
    ExceptionInfo::new(
        "ZeroDivisionError",
        "division by zero",
        vec![
            Frame::new("/studio/tools/calc/main.rs", 12, "main"),
            Frame::new("/studio/tools/calc/math.rs", 3, "divide"),
        ],
    )
}

/// An app over `store`, working in the test project
pub fn test_app(store: &Arc<MemoryStore>, settings: Settings) -> TicketsApp {
    let store: Arc<dyn TicketStore> = store.clone();
    TicketsApp::new(settings, store).with_context(PipelineContext {
        project: Some(EntityRef::project(TEST_PROJECT_ID).with_name("Big Buck")),
        user: Some(EntityRef::new("HumanUser", 88)),
        ..PipelineContext::default()
    })
}

/// Store keeping ticket records in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    uploads: Mutex<Vec<(i64, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record; `value` must be a JSON object with an `id`
    pub fn insert(&self, value: Value) {
        let record = value.as_object().cloned().expect("record must be an object");
        self.records.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// `(ticket id, file name)` of every upload, in order
    pub fn uploads(&self) -> Vec<(i64, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

impl TicketStore for MemoryStore {
    fn find_one(&self, _kind: &str, filters: &[Filter], _fields: &[String]) -> Result<Option<Record>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|record| filters.iter().all(|f| f.matches(record)))
            .cloned())
    }

    fn create(&self, _kind: &str, data: Record, _return_fields: &[String]) -> Result<Record> {
        let mut records = self.records.lock().unwrap();
        let id = records.iter().filter_map(record_id).max().unwrap_or(0) + 1;
        let mut record = data;
        record.insert("id".to_string(), Value::from(id));
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, kind: &str, id: i64, data: Record) -> Result<Record> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or_else(|| TicketsError::RecordNotFound {
                kind: kind.to_string(),
                id,
            })?;
        record.extend(data);
        Ok(record.clone())
    }

    fn upload(&self, _kind: &str, id: i64, path: &Path, _field_name: &str) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.uploads.lock().unwrap().push((id, name));
        Ok(())
    }

    fn read_schema(&self, kind: &str, field: &str) -> Result<Vec<String>> {
        ticket_schema()
            .get(kind)
            .and_then(|fields| fields.get(field))
            .cloned()
            .ok_or_else(|| TicketsError::store("read schema", format!("{kind}.{field}")))
    }
}
