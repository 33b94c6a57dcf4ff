//! JSON documents for invoices and expenses.
//!
//! Each file holds one collection under a single key, e.g.
//! `{ "invoices": [...] }`. Like the task store, every call re-reads the
//! file and every write replaces it atomically.

use super::files::{atomic_write, read_file};
use crate::domain::{Expense, Invoice};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A record kept in a [`RecordFile`]
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Key of the collection in the JSON document
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
    fn touch(&mut self, now: DateTime<Utc>);
}

impl Record for Invoice {
    const COLLECTION: &'static str = "invoices";

    fn id(&self) -> Uuid {
        self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Record for Expense {
    const COLLECTION: &'static str = "expenses";

    fn id(&self) -> Uuid {
        self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone)]
pub struct RecordFile<T> {
    path: PathBuf,
    _records: PhantomData<T>,
}

impl<T: Record> RecordFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<T>, StoreError> {
        let content = read_file(&self.path).map_err(|e| StoreError::Unavailable(format!("{:#}", e)))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut doc: BTreeMap<String, Vec<T>> = serde_json::from_str(&content)?;
        Ok(doc.remove(T::COLLECTION).unwrap_or_default())
    }

    pub fn get(&self, id: Uuid) -> Result<T, StoreError> {
        self.list()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or(StoreError::NotFound(id))
    }

    pub fn insert(&mut self, record: T) -> Result<T, StoreError> {
        let mut records = self.list()?;
        records.push(record.clone());
        self.save(&records)?;
        Ok(record)
    }

    /// Change one record in place and return the saved version
    pub fn update<F>(&mut self, id: Uuid, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T),
    {
        let mut records = self.list()?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(StoreError::NotFound(id))?;
        change(record);
        record.touch(Utc::now());
        let updated = record.clone();
        self.save(&records)?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<(), StoreError> {
        let mut records = self.list()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.save(&records)
    }

    fn save(&self, records: &[T]) -> Result<(), StoreError> {
        let doc = BTreeMap::from([(T::COLLECTION, records)]);
        let json = serde_json::to_string_pretty(&doc)?;
        atomic_write(&self.path, &json).map_err(|e| StoreError::Unavailable(format!("{:#}", e)))?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "{} written", T::COLLECTION);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invoice::InvoiceDraft;
    use crate::domain::{ExpenseDraft, InvoiceStatus};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn expense(name: &str) -> Expense {
        let draft = ExpenseDraft {
            name: name.to_string(),
            amount: "12.5".to_string(),
            category: "travel".to_string(),
            ..ExpenseDraft::default()
        };
        draft
            .into_expense(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), Utc::now())
            .unwrap()
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let temp_dir = tempdir().unwrap();
        let file: RecordFile<Expense> = RecordFile::new(temp_dir.path().join("expenses.json"));
        assert!(file.list().unwrap().is_empty());
    }

    #[test]
    fn test_document_uses_collection_key() {
        let temp_dir = tempdir().unwrap();
        let mut file = RecordFile::new(temp_dir.path().join("expenses.json"));
        let saved = file.insert(expense("Train")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(raw["expenses"][0]["name"], "Train");
        assert_eq!(raw["expenses"][0]["category"], "Travel");
        assert_eq!(file.get(saved.id).unwrap(), saved);
    }

    #[test]
    fn test_update_and_delete() {
        let temp_dir = tempdir().unwrap();
        let mut file = RecordFile::new(temp_dir.path().join("invoices.json"));
        let draft = InvoiceDraft {
            number: "INV-20240301-1".to_string(),
            project: "Acme".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            hours_worked: 1.0,
            hourly_rate: 40.0,
            total_amount: 40.0,
        };
        let invoice = file.insert(Invoice::issue(draft, None, None, Utc::now())).unwrap();

        let paid = file.update(invoice.id, |inv| inv.status = InvoiceStatus::Paid).unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert!(paid.updated_at >= invoice.updated_at);
        assert_eq!(file.get(invoice.id).unwrap().status, InvoiceStatus::Paid);

        file.delete(invoice.id).unwrap();
        assert!(matches!(file.delete(invoice.id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            file.update(invoice.id, |_| {}),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let temp_dir = tempdir().unwrap();
        let file: RecordFile<Invoice> = RecordFile::new(temp_dir.path().join("invoices.json"));
        std::fs::write(file.path(), "[1, 2").unwrap();
        assert!(matches!(file.list(), Err(StoreError::Json(_))));
    }
}
