//! Previous-day stock resolution.
//!
//! The previous stock of an item on a date is the ending stock of the most
//! recent record for that item dated strictly before it. Records sharing that
//! most recent date are ordered by id and the highest id wins. Without any
//! prior record the catalog baseline is used, and an unknown item yields 0.
//!
//! Everything here is derived from the record log passed in; nothing is
//! cached, so the answer stays correct as the log grows.

use stockbook_core::{RecordDate, RecordId};

use crate::catalog::Catalog;
use crate::record::InventoryRecord;

/// Where a resolved previous stock came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockSource {
    /// Ending stock of an earlier record.
    Record(RecordId),
    /// Catalog baseline (no earlier record for the item).
    Catalog,
    /// Item is neither recorded before the date nor in the catalog.
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PreviousStock {
    pub value: i64,
    pub source: StockSource,
}

/// Most recent record of `item` dated strictly before `date`.
pub fn latest_before<'a>(
    records: &'a [InventoryRecord],
    item: &str,
    date: &RecordDate,
) -> Option<&'a InventoryRecord> {
    records
        .iter()
        .filter(|r| r.item == item && r.date < *date)
        .max_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)))
}

pub fn resolve(
    records: &[InventoryRecord],
    catalog: &Catalog,
    item: &str,
    date: &RecordDate,
) -> PreviousStock {
    if let Some(record) = latest_before(records, item, date) {
        return PreviousStock {
            value: record.stock,
            source: StockSource::Record(record.id),
        };
    }
    match catalog.initial_stock(item) {
        Some(value) => PreviousStock {
            value,
            source: StockSource::Catalog,
        },
        None => PreviousStock {
            value: 0,
            source: StockSource::Unknown,
        },
    }
}

pub fn previous_stock(
    records: &[InventoryRecord],
    catalog: &Catalog,
    item: &str,
    date: &RecordDate,
) -> i64 {
    resolve(records, catalog, item, date).value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::record::NewRecord;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new("A", "1kg", "Acme", 10),
            CatalogItem::new("B", "box", "Bolt", 3),
        ])
        .unwrap()
    }

    fn date(s: &str) -> RecordDate {
        s.parse().unwrap()
    }

    fn record(id: i64, item: &str, day: &str, stock: i64) -> InventoryRecord {
        NewRecord {
            date: date(day),
            item: item.to_string(),
            spec: String::new(),
            supplier: String::new(),
            previous_stock: 0,
            usage: 0,
            incoming: 0,
            stock,
            operator: "op".to_string(),
        }
        .into_record(RecordId::from_millis(id), "")
    }

    #[test]
    fn falls_back_to_catalog_baseline() {
        let resolved = resolve(&[], &catalog(), "A", &date("2024-01-05"));
        assert_eq!(resolved.value, 10);
        assert_eq!(resolved.source, StockSource::Catalog);
    }

    #[test]
    fn unknown_item_resolves_to_zero() {
        let resolved = resolve(&[], &catalog(), "nope", &date("2024-01-05"));
        assert_eq!(resolved, PreviousStock { value: 0, source: StockSource::Unknown });
    }

    #[test]
    fn uses_latest_prior_date_not_insertion_order() {
        let records = vec![
            record(1, "A", "2024-01-05", 7),
            record(2, "B", "2024-01-04", 99),
            record(3, "A", "2024-01-03", 2),
            record(4, "A", "2024-01-06", 5),
        ];
        assert_eq!(previous_stock(&records, &catalog(), "A", &date("2024-01-06")), 7);
    }

    #[test]
    fn same_day_and_later_records_are_ignored() {
        let records = vec![record(1, "A", "2024-01-06", 5), record(2, "A", "2024-01-07", 1)];
        assert_eq!(previous_stock(&records, &catalog(), "A", &date("2024-01-06")), 10);
    }

    #[test]
    fn equal_dates_resolve_to_highest_id() {
        let records = vec![
            record(20, "A", "2024-01-05", 4),
            record(10, "A", "2024-01-05", 8),
            record(15, "A", "2024-01-05", 6),
        ];
        let resolved = resolve(&records, &catalog(), "A", &date("2024-01-06"));
        assert_eq!(resolved.value, 4);
        assert_eq!(resolved.source, StockSource::Record(RecordId::from_millis(20)));
    }

    #[test]
    fn falls_back_for_unknown_item_even_with_records_of_other_items() {
        let records = vec![record(1, "A", "2024-01-01", 1)];
        assert_eq!(previous_stock(&records, &catalog(), "C", &date("2024-02-01")), 0);
    }

    fn arb_day() -> impl Strategy<Value = RecordDate> {
        (1u32..=28).prop_map(|d| date(&format!("2024-03-{d:02}")))
    }

    fn arb_records() -> impl Strategy<Value = Vec<InventoryRecord>> {
        prop::collection::vec(
            (prop::sample::select(vec!["A", "B", "C"]), arb_day(), 0i64..1_000),
            0..40,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (item, day, stock))| record(i as i64 + 1, item, day.as_str(), stock))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn baseline_when_nothing_precedes(records in arb_records(), day in arb_day()) {
            let catalog = catalog();
            let without_prior: Vec<_> = records
                .into_iter()
                .filter(|r| !(r.item == "A" && r.date < day))
                .collect();
            prop_assert_eq!(previous_stock(&without_prior, &catalog, "A", &day), 10);
        }

        #[test]
        fn matches_a_record_on_the_latest_prior_date(records in arb_records(), day in arb_day()) {
            let catalog = catalog();
            let prior: Vec<_> = records.iter().filter(|r| r.item == "A" && r.date < day).collect();
            prop_assume!(!prior.is_empty());

            let max_date = prior.iter().map(|r| r.date.clone()).max().unwrap();
            let expected = prior
                .iter()
                .filter(|r| r.date == max_date)
                .max_by_key(|r| r.id)
                .unwrap()
                .stock;

            prop_assert_eq!(previous_stock(&records, &catalog, "A", &day), expected);
        }

        #[test]
        fn unrelated_records_do_not_change_the_answer(
            records in arb_records(),
            noise in arb_records(),
            day in arb_day(),
        ) {
            let catalog = catalog();
            let only_a: Vec<_> = records.iter().filter(|r| r.item == "A").cloned().collect();
            let with_noise: Vec<_> = records
                .iter()
                .cloned()
                .chain(noise.into_iter().filter(|r| r.item != "A"))
                .collect();
            prop_assert_eq!(
                previous_stock(&only_a, &catalog, "A", &day),
                previous_stock(&with_noise, &catalog, "A", &day)
            );
        }
    }
}
