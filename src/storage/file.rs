//! Directory-backed [`TicketStore`]
//!
//! Records live as YAML files under `<root>/<kind>/<id>.yaml`; uploads are
//! copied to `<root>/attachments/<kind>/<id>/`. Used by the CLI when no
//! remote tracker is wired in, and by the integration tests.

use super::repository::{Filter, Record, TicketStore};
use crate::error::{Result, TicketsError};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Valid values per kind, then per list field
pub type SchemaValues = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Local file storage for records
pub struct FileStore {
    root: PathBuf,
    schema: SchemaValues,
    // Serialises id allocation and read-modify-write within this process.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("root", &self.root).finish()
    }
}

impl FileStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>, schema: SchemaValues) -> Self {
        Self {
            root: root.into(),
            schema,
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: &str) -> PathBuf {
        self.root.join(kind)
    }

    fn record_path(&self, kind: &str, id: i64) -> PathBuf {
        self.kind_dir(kind).join(format!("{id}.yaml"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| TicketsError::store("lock", "store lock poisoned"))
    }

    /// Load one record
    pub fn load(&self, kind: &str, id: i64) -> Result<Record> {
        let path = self.record_path(kind, id);
        if !path.exists() {
            return Err(TicketsError::RecordNotFound {
                kind: kind.to_string(),
                id,
            });
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load every record of a kind, ordered by id
    pub fn load_all(&self, kind: &str) -> Result<Vec<Record>> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i64>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        ids.into_iter().map(|id| self.load(kind, id)).collect()
    }

    fn save(&self, kind: &str, id: i64, record: &Record) -> Result<()> {
        fs::create_dir_all(self.kind_dir(kind))?;
        let content = serde_yaml::to_string(record)?;
        fs::write(self.record_path(kind, id), content)?;
        Ok(())
    }

    fn next_id(&self, kind: &str) -> Result<i64> {
        let max = self
            .load_all(kind)?
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }
}

fn project(record: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }
    record
        .iter()
        .filter(|(key, _)| {
            key.as_str() == "id" || key.as_str() == "type" || fields.iter().any(|f| f == *key)
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

impl TicketStore for FileStore {
    fn find_one(&self, kind: &str, filters: &[Filter], fields: &[String]) -> Result<Option<Record>> {
        Ok(self
            .load_all(kind)?
            .into_iter()
            .find(|record| filters.iter().all(|f| f.matches(record)))
            .map(|record| project(&record, fields)))
    }

    fn create(&self, kind: &str, data: Record, _return_fields: &[String]) -> Result<Record> {
        let _guard = self.lock()?;
        let id = self.next_id(kind)?;
        let mut record = data;
        record.insert("id".to_string(), Value::from(id));
        record.insert("type".to_string(), Value::from(kind));
        record.insert("created_at".to_string(), Value::from(Utc::now().to_rfc3339()));
        self.save(kind, id, &record)?;
        Ok(record)
    }

    fn update(&self, kind: &str, id: i64, data: Record) -> Result<Record> {
        let _guard = self.lock()?;
        let mut record = self.load(kind, id)?;
        record.extend(data);
        record.insert("updated_at".to_string(), Value::from(Utc::now().to_rfc3339()));
        self.save(kind, id, &record)?;
        Ok(record)
    }

    fn upload(&self, kind: &str, id: i64, path: &Path, field_name: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut record = self.load(kind, id)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| TicketsError::InvalidInput(format!("Not a file: {}", path.display())))?;
        let target_dir = self.root.join("attachments").join(kind).join(id.to_string());
        fs::create_dir_all(&target_dir)?;
        let target = target_dir.join(file_name);
        fs::copy(path, &target)?;

        let entry = Value::from(target.to_string_lossy().into_owned());
        match record.get_mut(field_name) {
            Some(Value::Array(items)) => items.push(entry),
            _ => {
                record.insert(field_name.to_string(), Value::Array(vec![entry]));
            },
        }
        self.save(kind, id, &record)
    }

    fn read_schema(&self, kind: &str, field: &str) -> Result<Vec<String>> {
        self.schema
            .get(kind)
            .and_then(|fields| fields.get(field))
            .cloned()
            .ok_or_else(|| {
                TicketsError::store(
                    "read schema",
                    format!("{kind}.{field} is not a list field"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ticket_schema;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn store(temp_dir: &TempDir) -> FileStore {
        FileStore::new(temp_dir.path().join("store"), ticket_schema())
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let first = store.create("Ticket", record(json!({"title": "a"})), &[]).unwrap();
        let second = store.create("Ticket", record(json!({"title": "b"})), &[]).unwrap();

        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert_eq!(store.load_all("Ticket").unwrap().len(), 2);
    }

    #[test]
    fn test_find_one_and_project_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store
            .create("Ticket", record(json!({"title": "a", "sg_error": "E1"})), &[])
            .unwrap();
        store
            .create(
                "Ticket",
                record(json!({"title": "b", "sg_error": "E2", "sg_count": 3})),
                &[],
            )
            .unwrap();

        let found = store
            .find_one("Ticket", &[Filter::is("sg_error", "E2")], &["sg_count".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(found["id"], 2);
        assert_eq!(found["sg_count"], 3);
        assert!(found.get("title").is_none());

        let missing = store
            .find_one("Ticket", &[Filter::is("sg_error", "E3")], &[])
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_update_merges_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.create("Ticket", record(json!({"title": "a"})), &[]).unwrap();

        let updated = store.update("Ticket", 1, record(json!({"sg_count": 4}))).unwrap();
        assert_eq!(updated["title"], "a");
        assert_eq!(updated["sg_count"], 4);
        assert!(matches!(
            store.update("Ticket", 9, Record::new()),
            Err(TicketsError::RecordNotFound { id: 9, .. })
        ));
    }

    #[test]
    fn test_upload_copies_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.create("Ticket", record(json!({"title": "a"})), &[]).unwrap();

        let shot = temp_dir.path().join("capture.png");
        fs::write(&shot, b"png").unwrap();
        store.upload("Ticket", 1, &shot, "attachments").unwrap();
        store.upload("Ticket", 1, &shot, "attachments").unwrap();

        let loaded = store.load("Ticket", 1).unwrap();
        assert_eq!(loaded["attachments"].as_array().unwrap().len(), 2);
        assert!(store.root().join("attachments/Ticket/1/capture.png").exists());
    }

    #[test]
    fn test_read_schema() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        assert_eq!(
            store.read_schema("Ticket", "sg_priority").unwrap(),
            vec!["1", "2", "3", "4", "5"]
        );
        assert!(store.read_schema("Ticket", "title").is_err());
    }
}
