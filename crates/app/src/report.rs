//! Report request workflow.
//!
//! Asking the endpoint for a report sends an email that cannot be recalled,
//! so the request goes through an explicit confirmation step:
//!
//! ```text
//! Idle -> AwaitingConfirmation -> Dispatching -> Done | Failed
//!              |
//!              +-- declined --> Idle
//! ```
//!
//! `Done` and `Failed` are terminal for one request; a new request may start
//! from either of them.

use thiserror::Error;

use crate::config::Config;
use crate::gateway::{SyncGateway, dispatch};
use crate::types::{SyncAction, SyncOutcome};

/// Operator name sent when none was entered.
pub const UNSPECIFIED_OPERATOR: &str = "未指定";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportState {
    Idle,
    AwaitingConfirmation { operator: String },
    Dispatching { operator: String },
    Done { operator: String },
    Failed { operator: String, reason: String },
}

impl ReportState {
    pub fn name(&self) -> &'static str {
        match self {
            ReportState::Idle => "idle",
            ReportState::AwaitingConfirmation { .. } => "awaiting_confirmation",
            ReportState::Dispatching { .. } => "dispatching",
            ReportState::Done { .. } => "done",
            ReportState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("spreadsheet endpoint is not configured; save one before sending reports")]
    NotConfigured,
    #[error("cannot {action} while report is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Question put to the operator before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPrompt {
    pub operator: String,
    pub recipient: Option<String>,
}

impl core::fmt::Display for ReportPrompt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.recipient {
            Some(to) => write!(f, "Send the cumulative report to {to}?"),
            None => f.write_str("Send the cumulative report?"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportFlow {
    state: ReportState,
    recipient: Option<String>,
}

impl ReportFlow {
    pub fn new(recipient: Option<String>) -> Self {
        Self {
            state: ReportState::Idle,
            recipient,
        }
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    /// Start a request. Refused up front when no endpoint is configured.
    pub fn request(&mut self, operator: &str, config: &Config) -> Result<ReportPrompt, ReportError> {
        match self.state {
            ReportState::Idle | ReportState::Done { .. } | ReportState::Failed { .. } => {}
            _ => {
                return Err(ReportError::InvalidTransition {
                    action: "request a report",
                    state: self.state.name(),
                });
            }
        }
        if !config.is_configured() {
            return Err(ReportError::NotConfigured);
        }

        let operator = match operator.trim() {
            "" => UNSPECIFIED_OPERATOR.to_string(),
            name => name.to_string(),
        };
        self.state = ReportState::AwaitingConfirmation {
            operator: operator.clone(),
        };
        Ok(ReportPrompt {
            operator,
            recipient: self.recipient.clone(),
        })
    }

    /// The operator said no; nothing is sent.
    pub fn decline(&mut self) -> Result<(), ReportError> {
        let ReportState::AwaitingConfirmation { .. } = self.state else {
            return Err(ReportError::InvalidTransition {
                action: "decline",
                state: self.state.name(),
            });
        };
        tracing::info!("report request declined");
        self.state = ReportState::Idle;
        Ok(())
    }

    /// The operator said yes; send the request.
    ///
    /// `Done` means the request was dispatched, not that the email went out.
    pub async fn confirm(
        &mut self,
        gateway: &dyn SyncGateway,
        config: &Config,
    ) -> Result<SyncOutcome, ReportError> {
        let ReportState::AwaitingConfirmation { operator } = &self.state else {
            return Err(ReportError::InvalidTransition {
                action: "confirm",
                state: self.state.name(),
            });
        };
        let operator = operator.clone();

        self.state = ReportState::Dispatching {
            operator: operator.clone(),
        };
        let action = SyncAction::SendReport {
            operator: operator.clone(),
        };
        let outcome = dispatch(gateway, config, &action).await;

        let next = match &outcome {
            // The endpoint was removed between request and confirmation.
            SyncOutcome::NotConfigured => {
                self.state = ReportState::Idle;
                return Err(ReportError::NotConfigured);
            }
            SyncOutcome::Dispatched => ReportState::Done { operator },
            SyncOutcome::DispatchFailed(reason) => ReportState::Failed {
                operator,
                reason: reason.clone(),
            },
        };
        self.state = next;
        Ok(outcome)
    }
}

/// Status line for a finished report request.
pub fn report_status(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::NotConfigured => "report not sent: spreadsheet sync is not configured".to_string(),
        SyncOutcome::Dispatched => {
            "report request sent (delivery unconfirmed; check the mailbox, including spam)".to_string()
        }
        SyncOutcome::DispatchFailed(reason) => format!("report request failed: {reason}"),
    }
}
