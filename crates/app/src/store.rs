//! Record log and settings storage abstractions.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use stockbook_core::RecordId;
use stockbook_inventory::InventoryRecord;

/// Storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored {slot} slot is not valid: {reason}")]
    Corrupt { slot: &'static str, reason: String },
    #[error("record id {0} already exists")]
    DuplicateId(RecordId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Builds the next record from the log as it stands at append time.
pub type RecordBuilder<'a> = Box<dyn FnOnce(&[InventoryRecord]) -> InventoryRecord + Send + 'a>;

/// Append-only record log.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Build a record from the current log and append it at the end, as one
    /// step: no other append on this store lands between the read `build`
    /// sees and the write.
    ///
    /// Existing records are never rewritten or reordered. A record whose id is
    /// already present is rejected.
    async fn append_with(&self, build: RecordBuilder<'_>) -> Result<InventoryRecord, StoreError>;

    /// Append an already built record.
    async fn append(&self, record: InventoryRecord) -> Result<(), StoreError> {
        self.append_with(Box::new(move |_: &[InventoryRecord]| record)).await.map(drop)
    }

    /// Every record in insertion order.
    async fn all(&self) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Records of one item in insertion order.
    async fn records_for(&self, item: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut records = self.all().await?;
        records.retain(|r| r.item == item);
        Ok(records)
    }
}

/// Persisted endpoint setting.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_endpoint(&self) -> Result<Option<String>, StoreError>;
    async fn store_endpoint(&self, url: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<InventoryRecord>>,
    endpoint: RwLock<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<InventoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            endpoint: RwLock::new(None),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage("lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn append_with(&self, build: RecordBuilder<'_>) -> Result<InventoryRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = build(records.as_slice());
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn all(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        Ok(self.records.read().map_err(|_| poisoned())?.clone())
    }
}

#[async_trait]
impl SettingsStore for InMemoryStore {
    async fn load_endpoint(&self) -> Result<Option<String>, StoreError> {
        Ok(self.endpoint.read().map_err(|_| poisoned())?.clone())
    }

    async fn store_endpoint(&self, url: &str) -> Result<(), StoreError> {
        *self.endpoint.write().map_err(|_| poisoned())? = Some(url.to_string());
        Ok(())
    }
}
