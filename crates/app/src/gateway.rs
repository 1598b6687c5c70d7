//! One-way sync to the spreadsheet endpoint.
//!
//! Requests are fire-and-forget: the response is dropped unread, so the only
//! distinction the client can make is whether the request could be sent.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, Endpoint};
use crate::types::{SyncAction, SyncOutcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("request dispatch failed: {0}")]
    Dispatch(String),
}

/// Transport to the spreadsheet endpoint.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// POST `action` as JSON to `endpoint`.
    ///
    /// `Ok(())` only means the request was sent.
    async fn send(&self, endpoint: &Endpoint, action: &SyncAction) -> Result<(), GatewayError>;
}

/// `reqwest`-backed gateway.
#[derive(Debug, Clone, Default)]
pub struct HttpSyncGateway {
    client: reqwest::Client,
}

impl HttpSyncGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn send(&self, endpoint: &Endpoint, action: &SyncAction) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(endpoint.url().clone())
            .json(action)
            .send()
            .await
            .map_err(|e| GatewayError::Dispatch(e.to_string()))?;

        // Status and body are deliberately not inspected.
        drop(response);
        Ok(())
    }
}

/// Send `action` using the current configuration.
pub async fn dispatch(
    gateway: &dyn SyncGateway,
    config: &Config,
    action: &SyncAction,
) -> SyncOutcome {
    let Some(endpoint) = config.endpoint() else {
        tracing::info!(action = action.name(), "sync skipped: no endpoint configured");
        return SyncOutcome::NotConfigured;
    };

    match gateway.send(endpoint, action).await {
        Ok(()) => {
            tracing::info!(action = action.name(), "sync request dispatched");
            SyncOutcome::Dispatched
        }
        Err(err) => {
            tracing::warn!(action = action.name(), error = %err, "sync dispatch failed");
            SyncOutcome::DispatchFailed(err.to_string())
        }
    }
}
