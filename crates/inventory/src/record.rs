use serde::{Deserialize, Serialize};

use stockbook_core::{Entity, RecordDate, RecordId};

/// One operator-submitted stock snapshot for an item on a date.
///
/// Records are append-only: once stored they are never edited or removed.
/// Field names on the wire are camelCase to match the spreadsheet endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: RecordId,
    pub date: RecordDate,
    pub item: String,
    pub spec: String,
    pub supplier: String,
    pub previous_stock: i64,
    pub usage: i64,
    pub incoming: i64,
    pub stock: i64,
    pub operator: String,
    pub timestamp: String,
}

impl Entity for InventoryRecord {
    type Id = RecordId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A validated record that has not been assigned an id or timestamp yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub date: RecordDate,
    pub item: String,
    pub spec: String,
    pub supplier: String,
    pub previous_stock: i64,
    pub usage: i64,
    pub incoming: i64,
    pub stock: i64,
    pub operator: String,
}

impl NewRecord {
    pub fn into_record(self, id: RecordId, timestamp: impl Into<String>) -> InventoryRecord {
        InventoryRecord {
            id,
            date: self.date,
            item: self.item,
            spec: self.spec,
            supplier: self.supplier,
            previous_stock: self.previous_stock,
            usage: self.usage,
            incoming: self.incoming,
            stock: self.stock,
            operator: self.operator,
            timestamp: timestamp.into(),
        }
    }
}

/// Read a quantity the way a lenient form field does.
///
/// Leading whitespace is skipped and the longest integer prefix is used
/// (`"12abc"` reads as 12). Missing, empty or non-numeric input reads as 0.
/// Negative values are clamped to 0; quantities are never negative.
pub fn lenient_quantity(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if !seen_digit || negative { 0 } else { value }
}
