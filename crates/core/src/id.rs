//! Strongly-typed identifiers used across the domain.

use serde::{Deserialize, Serialize};

/// Identifier of an inventory record.
///
/// Derived from the creation time in epoch milliseconds, bumped past the
/// largest existing id when the clock does not advance (or goes backwards),
/// so ids are unique and strictly increasing in insertion order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Next id for a record created at `now_millis`, given the largest id
    /// already present in the log.
    pub fn next(now_millis: i64, last: Option<RecordId>) -> Self {
        match last {
            Some(RecordId(last)) if now_millis <= last => Self(last + 1),
            _ => Self(now_millis),
        }
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_uses_clock_when_it_advances() {
        let last = Some(RecordId::from_millis(1_000));
        assert_eq!(RecordId::next(2_000, last), RecordId::from_millis(2_000));
        assert_eq!(RecordId::next(5, None), RecordId::from_millis(5));
    }

    #[test]
    fn next_bumps_past_last_when_clock_stalls() {
        let last = Some(RecordId::from_millis(1_000));
        assert_eq!(RecordId::next(1_000, last), RecordId::from_millis(1_001));
        assert_eq!(RecordId::next(900, last), RecordId::from_millis(1_001));
    }
}
