//! Calendar date of an inventory record.

use core::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const FORMAT: &str = "%Y-%m-%d";

/// A record date in zero-padded `YYYY-MM-DD` form.
///
/// Ordering is the string ordering, which coincides with calendar ordering
/// because every component is zero-padded to a fixed width.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordDate(String);

impl RecordDate {
    /// Parse and validate a `YYYY-MM-DD` date.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let raw = raw.trim();
        let valid_shape = raw.len() == 10
            && raw.char_indices().all(|(i, c)| match i {
                4 | 7 => c == '-',
                _ => c.is_ascii_digit(),
            });
        if !valid_shape {
            return Err(DomainError::validation(format!(
                "date must be YYYY-MM-DD, got '{raw}'"
            )));
        }
        NaiveDate::parse_from_str(raw, FORMAT)
            .map_err(|e| DomainError::validation(format!("invalid date '{raw}': {e}")))?;
        Ok(Self(raw.to_string()))
    }

    /// Today's date in the local time zone (the form's default).
    pub fn today() -> Self {
        Self::from(Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for RecordDate {}

impl From<NaiveDate> for RecordDate {
    fn from(value: NaiveDate) -> Self {
        Self(value.format(FORMAT).to_string())
    }
}

impl FromStr for RecordDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordDate {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordDate> for String {
    fn from(value: RecordDate) -> Self {
        value.0
    }
}

impl core::fmt::Display for RecordDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
