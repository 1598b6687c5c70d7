//! Spreadsheet endpoint configuration.
//!
//! `Config` is an explicit value: the workflows receive it per call and the
//! owner swaps in the value returned by [`save_endpoint`] as soon as it
//! succeeds, so a new endpoint is active without a restart.

use reqwest::Url;
use thiserror::Error;

use crate::store::{SettingsStore, StoreError};

/// Host serving the spreadsheet's web-app endpoints.
pub const PROVIDER_HOST: &str = "script.google.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint URL is empty")]
    Empty,
    #[error("endpoint URL is malformed: {0}")]
    Malformed(String),
    #[error("endpoint URL must use http or https, got '{0}'")]
    Scheme(String),
    #[error("endpoint URL must point at {expected}, got '{host}'")]
    WrongHost { host: String, expected: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfigError {
    /// Input was rejected (as opposed to the store failing).
    pub fn is_validation(&self) -> bool {
        !matches!(self, ConfigError::Store(_))
    }
}

/// Which host an endpoint URL must point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    host: String,
}

impl EndpointPolicy {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn allows(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.host || host.ends_with(&format!(".{}", self.host))
    }
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::new(PROVIDER_HOST)
    }
}

/// A validated endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn parse(raw: &str, policy: &EndpointPolicy) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::Empty);
        }
        let url = Url::parse(raw).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Scheme(url.scheme().to_string()));
        }
        let host = url.host_str().unwrap_or_default();
        if !policy.allows(host) {
            return Err(ConfigError::WrongHost {
                host: host.to_string(),
                expected: policy.host().to_string(),
            });
        }
        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl core::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active sync configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    endpoint: Option<Endpoint>,
}

impl Config {
    pub fn local_only() -> Self {
        Self::default()
    }

    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
        }
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Read the persisted endpoint.
    ///
    /// A stored URL that no longer passes validation is ignored (with a
    /// warning) and the configuration falls back to local-only.
    pub async fn load(
        store: &dyn SettingsStore,
        policy: &EndpointPolicy,
    ) -> Result<Self, StoreError> {
        let Some(raw) = store.load_endpoint().await? else {
            return Ok(Self::local_only());
        };
        match Endpoint::parse(&raw, policy) {
            Ok(endpoint) => Ok(Self::with_endpoint(endpoint)),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring stored endpoint");
                Ok(Self::local_only())
            }
        }
    }
}

/// Validate and persist a new endpoint; returns the configuration to use
/// from now on. Nothing is written when validation fails.
pub async fn save_endpoint(
    store: &dyn SettingsStore,
    policy: &EndpointPolicy,
    raw: &str,
) -> Result<Config, ConfigError> {
    let endpoint = Endpoint::parse(raw, policy)?;
    store.store_endpoint(endpoint.as_str()).await?;
    tracing::info!(endpoint = %endpoint, "endpoint saved");
    Ok(Config::with_endpoint(endpoint))
}
