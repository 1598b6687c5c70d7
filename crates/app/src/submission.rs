//! Record submission workflow.
//!
//! 1. Validate the raw input and parse quantities leniently.
//! 2. Build the record against the log it is appended to (id and previous
//!    stock), in one serialized step. Failure here aborts the submission.
//! 3. Dispatch a `save` to the spreadsheet endpoint. Whatever happens here is
//!    reported, never undone: the record is already stored.

use chrono::{DateTime, Local};
use thiserror::Error;

use stockbook_core::{DomainError, RecordDate, RecordId};
use stockbook_inventory::{Catalog, InventoryRecord, NewRecord, lenient_quantity, previous_stock};

use crate::config::Config;
use crate::gateway::{SyncGateway, dispatch};
use crate::store::{RecordStore, StoreError};
use crate::types::{SyncAction, SyncOutcome};

/// Human-readable creation time stored on each record.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Raw form input, as typed by the operator.
#[derive(Debug, Clone, Default)]
pub struct RecordInput {
    /// `YYYY-MM-DD`; today's local date when absent or blank.
    pub date: Option<String>,
    pub item: String,
    pub usage: Option<String>,
    pub incoming: Option<String>,
    pub stock: Option<String>,
    pub operator: String,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("record was not saved: {0}")]
    Persistence(#[from] StoreError),
}

/// A stored record and what happened when syncing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub record: InventoryRecord,
    pub sync: SyncOutcome,
}

impl Submission {
    pub fn status(&self) -> String {
        self.sync.submission_status()
    }
}

pub struct SubmissionWorkflow<'a> {
    store: &'a dyn RecordStore,
    catalog: &'a Catalog,
    gateway: &'a dyn SyncGateway,
}

impl<'a> SubmissionWorkflow<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        catalog: &'a Catalog,
        gateway: &'a dyn SyncGateway,
    ) -> Self {
        Self {
            store,
            catalog,
            gateway,
        }
    }

    /// Store the record, then try to sync it.
    pub async fn submit(&self, input: RecordInput, config: &Config) -> Result<Submission, SubmitError> {
        let record = self.record_locally(input, Local::now()).await?;
        let sync = dispatch(
            self.gateway,
            config,
            &SyncAction::Save {
                record: record.clone(),
            },
        )
        .await;
        Ok(Submission { record, sync })
    }

    /// Build the record as of `now` and append it to the log.
    pub async fn record_locally(
        &self,
        input: RecordInput,
        now: DateTime<Local>,
    ) -> Result<InventoryRecord, SubmitError> {
        let item = input.item.trim().to_string();
        if item.is_empty() {
            return Err(DomainError::validation("item is required").into());
        }
        let date = match input.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => RecordDate::parse(raw)?,
            _ => RecordDate::from(now.date_naive()),
        };

        let (spec, supplier) = match self.catalog.get(&item) {
            Some(entry) => (entry.spec.clone(), entry.supplier.clone()),
            None => {
                tracing::warn!(%item, "item is not in the catalog");
                (String::new(), String::new())
            }
        };

        let usage = lenient_quantity(input.usage.as_deref());
        let incoming = lenient_quantity(input.incoming.as_deref());
        let stock = lenient_quantity(input.stock.as_deref());
        let operator = input.operator.trim().to_string();
        let now_millis = now.timestamp_millis();
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let catalog = self.catalog;

        // Id and previous stock come from the log the record is appended to,
        // so concurrent submissions see each other.
        let record = self
            .store
            .append_with(Box::new(move |existing: &[InventoryRecord]| {
                let last_id = existing.iter().map(|r| r.id).max();
                NewRecord {
                    previous_stock: previous_stock(existing, catalog, &item, &date),
                    date,
                    item,
                    spec,
                    supplier,
                    usage,
                    incoming,
                    stock,
                    operator,
                }
                .into_record(RecordId::next(now_millis, last_id), timestamp)
            }))
            .await?;

        tracing::info!(
            id = %record.id,
            item = %record.item,
            date = %record.date,
            previous_stock = record.previous_stock,
            stock = record.stock,
            "record saved locally"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::config::{Endpoint, EndpointPolicy};
    use crate::gateway::GatewayError;
    use crate::gateway::test_support::RecordingGateway;
    use crate::local_store::LocalStore;
    use crate::store::test_support::record;
    use crate::store::{InMemoryStore, RecordBuilder};
    use stockbook_inventory::CatalogItem;

    fn catalog() -> Catalog {
        Catalog::new(vec![CatalogItem::new("A", "1kg", "Acme", 10)]).unwrap()
    }

    fn configured() -> Config {
        Config::with_endpoint(
            Endpoint::parse(
                "https://script.google.com/macros/s/x/exec",
                &EndpointPolicy::default(),
            )
            .unwrap(),
        )
    }

    fn input(item: &str, date: &str, stock: &str) -> RecordInput {
        RecordInput {
            date: Some(date.to_string()),
            item: item.to_string(),
            usage: Some("1".to_string()),
            incoming: Some("0".to_string()),
            stock: Some(stock.to_string()),
            operator: "amy".to_string(),
        }
    }

    #[tokio::test]
    async fn builds_record_from_catalog_and_log() {
        let store = InMemoryStore::with_records(vec![record(1, "A", "2024-01-05", 7)]);
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let now = Local.with_ymd_and_hms(2024, 1, 6, 9, 30, 0).unwrap();
        let record = workflow
            .record_locally(input("A", "2024-01-06", "5"), now)
            .await
            .unwrap();

        assert_eq!(record.previous_stock, 7);
        assert_eq!(record.spec, "1kg");
        assert_eq!(record.supplier, "Acme");
        assert_eq!(record.stock, 5);
        assert_eq!(record.usage, 1);
        assert_eq!(record.operator, "amy");
        assert_eq!(record.timestamp, "2024/01/06 09:30:00");
        assert_eq!(record.id.as_i64(), now.timestamp_millis());
        assert_eq!(store.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_quantities_are_coerced_to_zero() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let raw = RecordInput {
            date: Some("2024-01-05".to_string()),
            item: "A".to_string(),
            usage: Some(String::new()),
            incoming: Some("abc".to_string()),
            stock: None,
            operator: String::new(),
        };
        let submission = workflow.submit(raw, &Config::local_only()).await.unwrap();

        assert_eq!(submission.record.usage, 0);
        assert_eq!(submission.record.incoming, 0);
        assert_eq!(submission.record.stock, 0);
        assert_eq!(submission.record.previous_stock, 10);
        assert_eq!(submission.sync, SyncOutcome::NotConfigured);
        assert!(submission.status().contains("local-only"));
    }

    #[tokio::test]
    async fn missing_date_defaults_to_today() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let now = Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let mut raw = input("A", "", "1");
        raw.date = Some("  ".to_string());
        let record = workflow.record_locally(raw, now).await.unwrap();
        assert_eq!(record.date.as_str(), "2024-03-09");
    }

    #[tokio::test]
    async fn invalid_input_stores_nothing() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let err = workflow.submit(input("  ", "2024-01-05", "1"), &configured()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));

        let err = workflow.submit(input("A", "2024/01/05", "1"), &configured()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(_)));

        assert!(store.all().await.unwrap().is_empty());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_item_is_recorded_without_catalog_details() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let submission = workflow
            .submit(input("Z", "2024-01-05", "3"), &Config::local_only())
            .await
            .unwrap();
        assert_eq!(submission.record.spec, "");
        assert_eq!(submission.record.supplier, "");
        assert_eq!(submission.record.previous_stock, 0);
    }

    #[tokio::test]
    async fn sync_failure_keeps_the_local_record() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::failing("connection refused");
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let submission = workflow
            .submit(input("A", "2024-01-05", "7"), &configured())
            .await
            .unwrap();

        assert!(submission.sync.is_failure());
        assert!(submission.status().contains("saved locally"));
        assert_eq!(store.all().await.unwrap(), vec![submission.record.clone()]);
        assert_eq!(
            gateway.sent(),
            vec![SyncAction::Save {
                record: submission.record
            }]
        );
    }

    #[tokio::test]
    async fn ids_stay_unique_when_the_clock_stalls() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let now = Local.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let first = workflow.record_locally(input("A", "2024-01-05", "1"), now).await.unwrap();
        let second = workflow.record_locally(input("A", "2024-01-05", "2"), now).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn concurrent_submissions_both_land_and_see_each_other() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);

        let now = Local.with_ymd_and_hms(2024, 1, 6, 9, 0, 0).unwrap();
        let (first, second) = tokio::join!(
            workflow.record_locally(input("A", "2024-01-05", "7"), now),
            workflow.record_locally(input("A", "2024-01-06", "3"), now),
        );
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first.id.as_i64(), now.timestamp_millis());
        assert_eq!(second.id.as_i64(), now.timestamp_millis() + 1);
        assert_eq!(first.previous_stock, 10);
        assert_eq!(second.previous_stock, 7);
        assert_eq!(store.all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn same_day_resubmission_sees_latest_prior_day() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&store, &catalog, &gateway);
        let config = Config::local_only();

        workflow.submit(input("A", "2024-01-05", "7"), &config).await.unwrap();
        let first = workflow.submit(input("A", "2024-01-06", "6"), &config).await.unwrap();
        let again = workflow.submit(input("A", "2024-01-06", "4"), &config).await.unwrap();

        assert_eq!(first.record.previous_stock, 7);
        assert_eq!(again.record.previous_stock, 7);
    }

    /// Gateway that looks at the store when it is called.
    struct ObservingGateway {
        store: Arc<InMemoryStore>,
        seen: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl SyncGateway for ObservingGateway {
        async fn send(&self, _endpoint: &Endpoint, _action: &SyncAction) -> Result<(), GatewayError> {
            let stored = self.store.all().await.map(|r| r.len()).unwrap_or(0);
            *self.seen.lock().unwrap() = Some(stored);
            Ok(())
        }
    }

    #[tokio::test]
    async fn record_is_stored_before_dispatch() {
        let store = Arc::new(InMemoryStore::new());
        let catalog = catalog();
        let gateway = ObservingGateway {
            store: store.clone(),
            seen: Mutex::new(None),
        };
        let workflow = SubmissionWorkflow::new(store.as_ref(), &catalog, &gateway);

        let submission = workflow
            .submit(input("A", "2024-01-05", "7"), &configured())
            .await
            .unwrap();
        assert_eq!(submission.sync, SyncOutcome::Dispatched);
        assert_eq!(*gateway.seen.lock().unwrap(), Some(1));
    }

    /// Store whose appends always fail.
    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn append_with(&self, _build: RecordBuilder<'_>) -> Result<InventoryRecord, StoreError> {
            Err(StoreError::Storage("disk full".to_string()))
        }

        async fn all(&self) -> Result<Vec<InventoryRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn persistence_failure_aborts_before_sync() {
        let catalog = catalog();
        let gateway = RecordingGateway::default();
        let workflow = SubmissionWorkflow::new(&BrokenStore, &catalog, &gateway);

        let err = workflow
            .submit(input("A", "2024-01-05", "7"), &configured())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Persistence(_)));
        assert!(gateway.sent().is_empty());
    }
}
