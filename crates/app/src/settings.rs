//! Process-level settings and catalog loading.

use std::path::{Path, PathBuf};

use anyhow::Context;

use stockbook_inventory::Catalog;

use crate::config::EndpointPolicy;

/// Settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,
    /// Catalog JSON file.
    pub catalog_path: PathBuf,
    /// Shown in the report confirmation prompt.
    pub report_recipient: Option<String>,
    pub endpoint_policy: EndpointPolicy,
}

impl AppSettings {
    /// Fill in defaults for anything not given explicitly.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        catalog_path: Option<PathBuf>,
        report_recipient: Option<String>,
        provider_host: Option<String>,
    ) -> anyhow::Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        let catalog_path = catalog_path.unwrap_or_else(|| data_dir.join("catalog.json"));
        let endpoint_policy = provider_host
            .filter(|h| !h.trim().is_empty())
            .map(|h| EndpointPolicy::new(h.trim()))
            .unwrap_or_default();

        Ok(Self {
            data_dir,
            catalog_path,
            report_recipient: report_recipient.filter(|r| !r.trim().is_empty()),
            endpoint_policy,
        })
    }
}

/// `{os data dir}/stockbook`.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    Ok(base.join("stockbook"))
}

/// Load the catalog file. A missing file yields an empty catalog.
pub fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "catalog file not found; starting with an empty catalog");
        return Ok(Catalog::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog at {}", path.display()))?;
    let catalog = Catalog::from_json_str(&raw)
        .with_context(|| format!("invalid catalog at {}", path.display()))?;
    tracing::info!(items = catalog.len(), "catalog loaded");
    Ok(catalog)
}
