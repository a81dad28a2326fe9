//! # Persistent Audit Store
//!
//! Stores deliberation records in Sled, an embedded database, so the audit
//! trail survives restarts.
//!
//! ## Storage Structure
//!
//! | Tree           | Key                 | Value                        |
//! |----------------|---------------------|------------------------------|
//! | `deliberations`| task id (16 bytes)  | JSON `DeliberationRecord`    |
//!
//! Task ids are v4 UUIDs, so iteration order is not chronological;
//! [`AuditStore::records`] sorts by creation time.

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use ethiq_council::{AuditSink, CouncilError, DeliberationRecord};

use crate::error::{AuditError, Result};
use crate::report::{AuditReport, ReportPeriod};

const DELIBERATION_TREE: &str = "deliberations";

/// Sled-backed deliberation store.
///
/// # Example
///
/// ```rust,no_run
/// use ethiq_audit::AuditStore;
///
/// let store = AuditStore::open("./data/audit").unwrap();
/// println!("{} deliberations on record", store.len());
/// ```
#[derive(Clone)]
pub struct AuditStore {
    db: sled::Db,
    deliberations: sled::Tree,
}

impl AuditStore {
    /// Opens or creates a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Database`] if the path is unusable or the
    /// database is corrupted.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let deliberations = db.open_tree(DELIBERATION_TREE)?;
        Ok(Self { db, deliberations })
    }

    /// Creates an in-memory store that is discarded on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let deliberations = db.open_tree(DELIBERATION_TREE)?;
        Ok(Self { db, deliberations })
    }

    /// Persists `record`, replacing any record with the same task id.
    pub fn store(&self, record: &DeliberationRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.deliberations
            .insert(record.task_id.as_bytes(), bytes)?;
        debug!("Stored deliberation {}", record.task_id);
        Ok(())
    }

    /// Loads the record for `task_id`.
    pub fn load(&self, task_id: Uuid) -> Result<Option<DeliberationRecord>> {
        match self.deliberations.get(task_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns true if a record exists for `task_id`.
    pub fn contains(&self, task_id: Uuid) -> Result<bool> {
        Ok(self.deliberations.contains_key(task_id.as_bytes())?)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.deliberations.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.deliberations.is_empty()
    }

    /// Every task id on record.
    pub fn task_ids(&self) -> Result<Vec<Uuid>> {
        let mut ids = Vec::new();
        for entry in self.deliberations.iter() {
            let (key, _) = entry?;
            let id = Uuid::from_slice(&key)
                .map_err(|_| AuditError::CorruptKey(format!("{:02x?}", key.as_ref())))?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Every stored record, oldest first.
    pub fn records(&self) -> Result<Vec<DeliberationRecord>> {
        let mut records = Vec::with_capacity(self.len());
        for entry in self.deliberations.iter() {
            let (_, bytes) = entry?;
            records.push(serde_json::from_slice::<DeliberationRecord>(&bytes)?);
        }
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    /// Removes the record for `task_id`. Returns true if it existed.
    pub fn remove(&self, task_id: Uuid) -> Result<bool> {
        Ok(self.deliberations.remove(task_id.as_bytes())?.is_some())
    }

    /// Builds a report over stored records.
    pub fn report(&self, period: ReportPeriod) -> Result<AuditReport> {
        let records = self.records()?;
        Ok(AuditReport::build(period, Utc::now(), records.iter()))
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for AuditStore {
    fn name(&self) -> &str {
        "audit_store"
    }

    async fn record(&self, record: &DeliberationRecord) -> ethiq_council::Result<()> {
        self.store(record)
            .map_err(|e| CouncilError::Sink(self.name().to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethiq_council::{Commander, ModerationContext};
    use std::sync::Arc;

    async fn sample_record() -> Arc<DeliberationRecord> {
        let commander = Commander::builder().build().unwrap();
        commander
            .deliberate_request(ethiq_council::ModerationRequest::new(
                "sample",
                ModerationContext::new().with_platform("forum"),
            ))
            .await
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let store = AuditStore::temporary().unwrap();
        let record = sample_record().await;

        store.store(&record).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains(record.task_id).unwrap());
        let loaded = store.load(record.task_id).unwrap().unwrap();
        assert_eq!(loaded.task_id, record.task_id);
        assert_eq!(loaded.request, record.request);
        assert_eq!(loaded.final_verdict.decision(), record.final_verdict.decision());
        assert_eq!(store.task_ids().unwrap(), vec![record.task_id]);
    }

    #[tokio::test]
    async fn test_missing_record() {
        let store = AuditStore::temporary().unwrap();
        assert!(store.load(Uuid::new_v4()).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit");
        let record = sample_record().await;

        {
            let store = AuditStore::open(&path).unwrap();
            store.store(&record).unwrap();
            store.flush().unwrap();
        }

        let store = AuditStore::open(&path).unwrap();
        assert_eq!(store.records().unwrap().len(), 1);
        let report = store.report(ReportPeriod::All).unwrap();
        assert_eq!(report.total_deliberations, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = AuditStore::temporary().unwrap();
        let record = sample_record().await;
        store.store(&record).unwrap();

        assert!(store.remove(record.task_id).unwrap());
        assert!(!store.remove(record.task_id).unwrap());
    }

    #[tokio::test]
    async fn test_as_audit_sink() {
        let store = AuditStore::temporary().unwrap();
        let commander = Commander::builder()
            .audit_sink(Arc::new(store.clone()))
            .build()
            .unwrap();

        let verdict_record = commander
            .deliberate_request(ethiq_council::ModerationRequest::new(
                "persist me",
                ModerationContext::new(),
            ))
            .await;
        commander.flush().await;

        assert!(store.contains(verdict_record.task_id).unwrap());
    }
}
