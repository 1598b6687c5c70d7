//! Read-only item catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockbook_core::ValueObject;

/// One known inventory item and its baseline stock.
///
/// Accepts both the English field names and the field names used by the
/// spreadsheet the catalog is exported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(alias = "品項")]
    pub name: String,
    #[serde(alias = "規格", default)]
    pub spec: String,
    #[serde(alias = "廠商", default)]
    pub supplier: String,
    #[serde(alias = "前日庫存", default)]
    pub initial_stock: i64,
}

impl CatalogItem {
    pub fn new(
        name: impl Into<String>,
        spec: impl Into<String>,
        supplier: impl Into<String>,
        initial_stock: i64,
    ) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            supplier: supplier.into(),
            initial_stock,
        }
    }

    /// Label shown when picking an item: `name (spec) - supplier`.
    pub fn label(&self) -> String {
        format!("{} ({}) - {}", self.name, self.spec, self.supplier)
    }
}

impl ValueObject for CatalogItem {}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog entry #{0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate catalog item: {0}")]
    Duplicate(String),

    #[error("catalog item '{name}' has negative initial stock {value}")]
    NegativeStock { name: String, value: i64 },

    #[error("failed to parse catalog: {0}")]
    Parse(String),
}

/// Immutable catalog keyed by item name, in load order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut by_name = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(idx));
            }
            if item.initial_stock < 0 {
                return Err(CatalogError::NegativeStock {
                    name: item.name.clone(),
                    value: item.initial_stock,
                });
            }
            if by_name.insert(item.name.clone(), idx).is_some() {
                return Err(CatalogError::Duplicate(item.name.clone()));
            }
        }
        Ok(Self { items, by_name })
    }

    /// Parse a JSON array of catalog items.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(items)
    }

    pub fn get(&self, name: &str) -> Option<&CatalogItem> {
        self.by_name.get(name).map(|&idx| &self.items[idx])
    }

    pub fn initial_stock(&self, name: &str) -> Option<i64> {
        self.get(name).map(|item| item.initial_stock)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
