//! `stockbook-app`
//!
//! **Responsibility:** the single-operator client shell around the inventory
//! domain.
//!
//! This crate provides:
//! - A durable local record log (SQLite key/value slots)
//! - Endpoint configuration with validation and reload-on-save
//! - A one-way sync gateway to the spreadsheet endpoint
//! - The record submission and report workflows
//!
//! The local log is the authority; the spreadsheet is a best-effort mirror.

pub mod commands;
pub mod config;
pub mod gateway;
pub mod local_store;
pub mod report;
pub mod settings;
pub mod store;
pub mod submission;
pub mod types;

pub use commands::AppState;
pub use config::{Config, ConfigError, Endpoint, EndpointPolicy};
pub use gateway::{HttpSyncGateway, SyncGateway};
pub use local_store::LocalStore;
pub use report::{ReportFlow, ReportState};
pub use store::{InMemoryStore, RecordStore, SettingsStore, StoreError};
pub use submission::{RecordInput, Submission, SubmissionWorkflow, SubmitError};
pub use types::{SyncAction, SyncOutcome};
