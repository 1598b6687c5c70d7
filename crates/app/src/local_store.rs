//! SQLite-backed durable storage.
//!
//! State lives in two named slots of a single key/value table:
//! `inventoryRecords` holds the JSON array of records and `webAppUrl` holds
//! the configured endpoint. The record slot is created empty exactly once;
//! opening an existing database never resets it.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;

use stockbook_inventory::InventoryRecord;

use crate::store::{RecordBuilder, RecordStore, SettingsStore, StoreError};

pub const RECORDS_SLOT: &str = "inventoryRecords";
pub const ENDPOINT_SLOT: &str = "webAppUrl";

/// Database file name inside the data directory.
pub const DB_FILE: &str = "stockbook.db";

/// Durable local store.
///
/// Cheap to clone; clones share the pool and the append lock.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
    /// Serializes read-modify-write appends to the record slot.
    append_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    /// Open (or create) the database at `{dir}/stockbook.db`.
    pub async fn open_in(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Self::open(&dir.join(DB_FILE)).await
    }

    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), "opened local store");
        Self::bootstrap(pool).await
    }

    /// Private in-memory database (tests, dry runs).
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection that never expires: each connection would
        // otherwise see its own empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool).await
    }

    async fn bootstrap(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        let created = sqlx::query(
            r#"
            INSERT INTO kv (key, value)
            VALUES (?1, '[]')
            ON CONFLICT(key) DO NOTHING
            "#,
        )
        .bind(RECORDS_SLOT)
        .execute(&pool)
        .await?
        .rows_affected();

        if created > 0 {
            tracing::info!("initialized empty record log");
        }

        Ok(Self {
            pool,
            append_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Raw contents of a slot.
    pub async fn slot(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_slot(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_records(raw: Option<&str>) -> Result<Vec<InventoryRecord>, StoreError> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
            slot: RECORDS_SLOT,
            reason: e.to_string(),
        }),
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn append_with(&self, build: RecordBuilder<'_>) -> Result<InventoryRecord, StoreError> {
        let _guard = self.append_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?1")
            .bind(RECORDS_SLOT)
            .fetch_optional(&mut *tx)
            .await?;

        // A slot that fails to decode is left untouched; appending would
        // otherwise replace the whole log.
        let mut records = decode_records(current.as_deref())?;
        let record = build(records.as_slice());
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        records.push(record.clone());

        let payload = serde_json::to_string(&records).map_err(|e| StoreError::Corrupt {
            slot: RECORDS_SLOT,
            reason: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO kv (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(RECORDS_SLOT)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(id = %record.id, total = records.len(), "record appended");
        Ok(record)
    }

    async fn all(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        let raw = self.slot(RECORDS_SLOT).await?;
        decode_records(raw.as_deref())
    }
}

#[async_trait]
impl SettingsStore for LocalStore {
    async fn load_endpoint(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .slot(ENDPOINT_SLOT)
            .await?
            .filter(|url| !url.trim().is_empty()))
    }

    async fn store_endpoint(&self, url: &str) -> Result<(), StoreError> {
        self.set_slot(ENDPOINT_SLOT, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::record;

    #[tokio::test]
    async fn fresh_store_has_empty_log() {
        let store = LocalStore::open_in_memory().await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(store.slot(RECORDS_SLOT).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = LocalStore::open_in(dir.path()).await.unwrap();
        store.append(record(1, "A", "2024-01-05", 7)).await.unwrap();
        store.append(record(2, "A", "2024-01-06", 4)).await.unwrap();
        store.close().await;

        // Re-opening runs the bootstrap again; it must not reset the log.
        let reopened = LocalStore::open_in(dir.path()).await.unwrap();
        let records = reopened.all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record(1, "A", "2024-01-05", 7));
        assert_eq!(records[1].stock, 4);
    }

    #[tokio::test]
    async fn corrupt_log_is_reported_and_preserved() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.set_slot(RECORDS_SLOT, "{oops").await.unwrap();

        assert!(matches!(store.all().await, Err(StoreError::Corrupt { .. })));
        assert!(matches!(
            store.append(record(1, "A", "2024-01-05", 1)).await,
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(store.slot(RECORDS_SLOT).await.unwrap().as_deref(), Some("{oops"));
    }

    #[tokio::test]
    async fn duplicate_id_leaves_log_unchanged() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.append(record(5, "A", "2024-01-05", 1)).await.unwrap();
        assert!(matches!(
            store.append(record(5, "B", "2024-01-05", 2)).await,
            Err(StoreError::DuplicateId(_))
        ));
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn endpoint_slot_round_trips_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_in(dir.path()).await.unwrap();
        assert_eq!(store.load_endpoint().await.unwrap(), None);

        store
            .store_endpoint("https://script.google.com/macros/s/abc/exec")
            .await
            .unwrap();
        store.close().await;

        let reopened = LocalStore::open_in(dir.path()).await.unwrap();
        assert_eq!(
            reopened.load_endpoint().await.unwrap().as_deref(),
            Some("https://script.google.com/macros/s/abc/exec")
        );
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(record(i + 1, "A", "2024-01-05", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn concurrent_builders_never_share_an_id() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_with(Box::new(|existing: &[InventoryRecord]| {
                        let next = existing.iter().map(|r| r.id.as_i64()).max().unwrap_or(0) + 1;
                        record(next, "A", "2024-01-05", 1)
                    }))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let ids: Vec<i64> = store.all().await.unwrap().iter().map(|r| r.id.as_i64()).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }
}
