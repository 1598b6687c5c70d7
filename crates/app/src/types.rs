//! Shared wire and status types.

use serde::Serialize;

use stockbook_inventory::InventoryRecord;

/// Request body sent to the spreadsheet endpoint.
///
/// Serializes as `{"action":"save","record":{...}}` or
/// `{"action":"sendReport","operator":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SyncAction {
    Save { record: InventoryRecord },
    SendReport { operator: String },
}

impl SyncAction {
    pub fn name(&self) -> &'static str {
        match self {
            SyncAction::Save { .. } => "save",
            SyncAction::SendReport { .. } => "sendReport",
        }
    }
}

/// Result of a sync attempt.
///
/// The endpoint's response is never read, so a dispatched request is not a
/// confirmed delivery: the remote side may still have rejected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No endpoint configured; the data stays local.
    NotConfigured,
    /// The request left this machine. Delivery is unconfirmed.
    Dispatched,
    /// The request could not be sent (network, DNS, connection refused).
    DispatchFailed(String),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::DispatchFailed(_))
    }

    /// Status line for a record submission. The record is already stored
    /// locally whenever this is shown.
    pub fn submission_status(&self) -> String {
        match self {
            SyncOutcome::NotConfigured => {
                "record saved locally; spreadsheet sync is not configured (local-only)".to_string()
            }
            SyncOutcome::Dispatched => {
                "record saved locally and sent to the spreadsheet (delivery unconfirmed)".to_string()
            }
            SyncOutcome::DispatchFailed(reason) => {
                format!("record saved locally; spreadsheet sync failed: {reason}")
            }
        }
    }
}
