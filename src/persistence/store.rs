//! Task store seam.
//!
//! `TaskStore` is the generic create/read/update/delete interface every task
//! write goes through. `JsonFileStore` keeps the records in one JSON document
//! and re-reads it on every call, so concurrent writers resolve as last write
//! wins.

use super::files::{atomic_write, read_file};
use crate::domain::{Task, TaskPatch};
use crate::error::{BillableError, BillableResult, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub trait TaskStore {
    fn list(&self) -> Result<Vec<Task>, StoreError>;
    fn get(&self, id: Uuid) -> Result<Task, StoreError>;
    fn insert(&mut self, task: Task) -> Result<Task, StoreError>;
    /// Apply `patch` to the stored record and return the new version
    fn update(&mut self, id: Uuid, patch: &TaskPatch) -> Result<Task, StoreError>;
    fn delete(&mut self, id: Uuid) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksDocument {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Task store backed by `tasks.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<TasksDocument, StoreError> {
        let content = read_file(&self.path).map_err(|e| StoreError::Unavailable(format!("{:#}", e)))?;
        if content.trim().is_empty() {
            return Ok(TasksDocument::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, doc: &TasksDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)?;
        atomic_write(&self.path, &json).map_err(|e| StoreError::Unavailable(format!("{:#}", e)))?;
        tracing::debug!(path = %self.path.display(), tasks = doc.tasks.len(), "task store written");
        Ok(())
    }
}

impl TaskStore for JsonFileStore {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.load()?.tasks)
    }

    fn get(&self, id: Uuid) -> Result<Task, StoreError> {
        self.load()?
            .tasks
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn insert(&mut self, task: Task) -> Result<Task, StoreError> {
        let mut doc = self.load()?;
        doc.tasks.push(task.clone());
        self.save(&doc)?;
        Ok(task)
    }

    fn update(&mut self, id: Uuid, patch: &TaskPatch) -> Result<Task, StoreError> {
        let mut doc = self.load()?;
        let task = doc
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(task);
        task.updated_at = Utc::now();
        let updated = task.clone();
        self.save(&doc)?;
        Ok(updated)
    }

    fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        let mut doc = self.load()?;
        let before = doc.tasks.len();
        doc.tasks.retain(|t| t.id != id);
        if doc.tasks.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.save(&doc)
    }
}

/// Resolve a full id or unique id prefix (hyphens optional) to a task id
pub fn resolve_id<S: TaskStore + ?Sized>(store: &S, prefix: &str) -> BillableResult<Uuid> {
    let ids: Vec<Uuid> = store.list()?.iter().map(|t| t.id).collect();
    match_id_prefix(ids, prefix, "task")
}

/// Pick the one id starting with `prefix`; `what` names the record kind in errors
pub fn match_id_prefix(
    ids: impl IntoIterator<Item = Uuid>,
    prefix: &str,
    what: &str,
) -> BillableResult<Uuid> {
    let needle = prefix.trim().replace('-', "").to_lowercase();
    if needle.is_empty() {
        return Err(BillableError::InvalidInput(format!("{} id is required", what)));
    }

    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(BillableError::InvalidInput(format!("no {} matches '{}'", what, prefix))),
        _ => Err(BillableError::InvalidInput(format!(
            "'{}' matches {} {}s, use a longer prefix",
            prefix,
            matches.len(),
            what
        ))),
    }
}

/// In-memory store with switchable write failures
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub tasks: Vec<Task>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    fn check_write(&mut self) -> Result<(), StoreError> {
        self.writes += 1;
        if self.fail_writes {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
impl TaskStore for MemoryStore {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.clone())
    }

    fn get(&self, id: Uuid) -> Result<Task, StoreError> {
        self.tasks.iter().find(|t| t.id == id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn insert(&mut self, task: Task) -> Result<Task, StoreError> {
        self.check_write()?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn update(&mut self, id: Uuid, patch: &TaskPatch) -> Result<Task, StoreError> {
        self.check_write()?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(task);
        Ok(task.clone())
    }

    fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.check_write()?;
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> JsonFileStore {
        JsonFileStore::new(dir.join("tasks.json"))
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_insert_get_and_list() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let task = store.insert(Task::new("Logo", "Acme")).unwrap();
        store.insert(Task::new("Copy", "Acme")).unwrap();

        assert_eq!(store.get(task.id).unwrap(), task);
        assert_eq!(store.list().unwrap().len(), 2);

        // A second handle on the same file sees the same records
        let other = store_in(temp_dir.path());
        assert_eq!(other.list().unwrap().len(), 2);
    }

    #[test]
    fn test_update_applies_patch_and_bumps_updated_at() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        let task = store.insert(Task::new("Logo", "Acme")).unwrap();

        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            time_spent: Some(300),
            ..TaskPatch::default()
        };
        let updated = store.update(task.id, &patch).unwrap();

        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.time_spent, 300);
        assert!(updated.updated_at >= task.updated_at);
        assert_eq!(store.get(task.id).unwrap(), updated);
    }

    #[test]
    fn test_update_unknown_id() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        let id = Uuid::new_v4();
        let result = store.update(id, &TaskPatch::default());
        assert!(matches!(result, Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn test_delete() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        let task = store.insert(Task::new("Logo", "Acme")).unwrap();

        store.delete(task.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.delete(task.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.list(), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_resolve_id_by_prefix() {
        let mut a = Task::new("a", "p");
        a.id = Uuid::parse_str("aaaa1111-0000-0000-0000-000000000000").unwrap();
        let mut b = Task::new("b", "p");
        b.id = Uuid::parse_str("aaaa2222-0000-0000-0000-000000000000").unwrap();
        let store = MemoryStore::with_tasks(vec![a.clone(), b]);

        assert_eq!(resolve_id(&store, "aaaa1").unwrap(), a.id);
        assert_eq!(resolve_id(&store, "AAAA1111-0000").unwrap(), a.id);
        assert!(matches!(resolve_id(&store, "aaaa"), Err(BillableError::InvalidInput(_))));
        assert!(matches!(resolve_id(&store, "ffff"), Err(BillableError::InvalidInput(_))));
        assert!(matches!(resolve_id(&store, " "), Err(BillableError::InvalidInput(_))));
    }
}
