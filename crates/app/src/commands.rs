//! Application state and the operations behind each form action.

use std::sync::Arc;

use stockbook_core::RecordDate;
use stockbook_inventory::{Catalog, InventoryRecord, PreviousStock, resolve};

use crate::config::{self, Config, ConfigError, EndpointPolicy};
use crate::gateway::SyncGateway;
use crate::report::{ReportError, ReportFlow, ReportPrompt, ReportState};
use crate::store::{RecordStore, SettingsStore, StoreError};
use crate::submission::{RecordInput, Submission, SubmissionWorkflow, SubmitError};
use crate::types::SyncOutcome;

/// State shared by the form actions.
///
/// The active [`Config`] lives here and is replaced whenever an endpoint is
/// saved; workflows receive it explicitly on every call.
pub struct AppState {
    records: Arc<dyn RecordStore>,
    settings: Arc<dyn SettingsStore>,
    catalog: Arc<Catalog>,
    gateway: Arc<dyn SyncGateway>,
    policy: EndpointPolicy,
    config: Config,
    report: ReportFlow,
}

impl AppState {
    /// Build the state, reading the persisted endpoint.
    pub async fn load(
        records: Arc<dyn RecordStore>,
        settings: Arc<dyn SettingsStore>,
        catalog: Arc<Catalog>,
        gateway: Arc<dyn SyncGateway>,
        policy: EndpointPolicy,
        report_recipient: Option<String>,
    ) -> Result<Self, StoreError> {
        let config = Config::load(settings.as_ref(), &policy).await?;
        match config.endpoint() {
            Some(endpoint) => tracing::info!(%endpoint, "spreadsheet sync enabled"),
            None => tracing::info!("spreadsheet sync not configured; records stay local"),
        }

        Ok(Self {
            records,
            settings,
            catalog,
            gateway,
            policy,
            config,
            report: ReportFlow::new(report_recipient),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn report_state(&self) -> &ReportState {
        self.report.state()
    }

    /// Previous stock for `item` on `date` (today when absent).
    pub async fn previous_stock(
        &self,
        item: &str,
        date: Option<&str>,
    ) -> Result<PreviousStock, SubmitError> {
        let date = match date.map(str::trim) {
            Some(raw) if !raw.is_empty() => RecordDate::parse(raw)?,
            _ => RecordDate::today(),
        };
        let records = self.records.all().await?;
        Ok(resolve(&records, &self.catalog, item.trim(), &date))
    }

    pub async fn submit(&self, input: RecordInput) -> Result<Submission, SubmitError> {
        SubmissionWorkflow::new(self.records.as_ref(), &self.catalog, self.gateway.as_ref())
            .submit(input, &self.config)
            .await
    }

    /// Stored records, optionally narrowed to one item.
    pub async fn records(&self, item: Option<&str>) -> Result<Vec<InventoryRecord>, StoreError> {
        match item {
            Some(item) => self.records.records_for(item.trim()).await,
            None => self.records.all().await,
        }
    }

    /// Validate, persist and activate a new endpoint.
    pub async fn save_endpoint(&mut self, raw: &str) -> Result<&Config, ConfigError> {
        let config = config::save_endpoint(self.settings.as_ref(), &self.policy, raw).await?;
        self.config = config;
        Ok(&self.config)
    }

    pub fn request_report(&mut self, operator: &str) -> Result<ReportPrompt, ReportError> {
        self.report.request(operator, &self.config)
    }

    pub fn decline_report(&mut self) -> Result<(), ReportError> {
        self.report.decline()
    }

    pub async fn confirm_report(&mut self) -> Result<SyncOutcome, ReportError> {
        self.report.confirm(self.gateway.as_ref(), &self.config).await
    }
}
