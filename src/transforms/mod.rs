//! # Table Transforms
//!
//! Pure functions over fetched tables: filters return a new table, grouping and
//! metric functions return scalars or [`Groups`]. They compose left to right.
//!
//! Malformed input never fails: an unknown column, or a non-numeric column
//! handed to a numeric aggregate, produces an empty table, empty groups, `0.0`
//! or `None`, and is logged at debug level. [`Table::column_index`] gives the
//! strict [`TransformError`] for callers that want to check first.
use crate::database::table::Table;
use crate::database::value::Value;
use crate::error::TransformError;
use chrono::NaiveDate;
use log::debug;
use std::cmp::Ordering;

pub mod criteria;
pub mod groups;

pub use criteria::{apply, FilterCriterion, Selection, ALL};
pub use groups::Groups;

/// Sorting order for [`sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

fn resolve(table: &Table, column: &str) -> Option<usize> {
    table
        .column_index(column)
        .inspect_err(|error| debug!("Transform skipped: {}", error))
        .ok()
}

fn resolve_numeric(table: &Table, column: &str) -> Option<usize> {
    let index = resolve(table, column)?;
    if table.columns()[index].kind.is_date() {
        debug!("Transform skipped: {}", TransformError::NotNumeric(column.to_owned()));
        return None;
    }
    Some(index)
}

fn retain(table: &Table, index: usize, keep: impl Fn(&Value) -> bool) -> Table {
    let records = table
        .records()
        .iter()
        .filter(|record| record.value_at(index).is_some_and(&keep))
        .cloned()
        .collect();
    table.with_records(records)
}

/// Keeps records whose `column` equals the selection; `Selection::All` returns the table unchanged.
pub fn filter_equals(table: &Table, column: &str, selection: impl Into<Selection>) -> Table {
    let selection = selection.into();
    if selection == Selection::All {
        return table.clone();
    }
    match resolve(table, column) {
        Some(index) => retain(table, index, |value| selection.accept(value)),
        None => table.with_records(Vec::new()),
    }
}

/// Keeps records whose `column` text contains `substring`; an empty substring keeps everything.
pub fn filter_contains(table: &Table, column: &str, substring: &str, case_sensitive: bool) -> Table {
    if substring.is_empty() {
        return table.clone();
    }
    let Some(index) = resolve(table, column) else {
        return table.with_records(Vec::new());
    };
    if case_sensitive {
        retain(table, index, |value| value.to_string().contains(substring))
    } else {
        let needle = substring.to_lowercase();
        retain(table, index, |value| value.to_string().to_lowercase().contains(&needle))
    }
}

/// Keeps records whose `column`, read as a date, is `date`. Unparsable values never match.
pub fn date_equals(table: &Table, column: &str, date: NaiveDate) -> Table {
    match resolve(table, column) {
        Some(index) => retain(table, index, |value| value.as_date() == Some(date)),
        None => table.with_records(Vec::new()),
    }
}

/// Number of records per distinct value of `column`, in first-seen order.
pub fn group_count(table: &Table, column: &str) -> Groups<usize> {
    let mut groups = Groups::new();
    let Some(index) = resolve(table, column) else {
        return groups;
    };
    for value in table.records().iter().filter_map(|record| record.value_at(index)) {
        *groups.entry(value, || 0) += 1;
    }
    groups
}

/// Mean of `numeric_column` per distinct value of `group_column`.
/// Non-numeric cells are skipped; a group left with no numbers is absent.
pub fn group_mean(table: &Table, group_column: &str, numeric_column: &str) -> Groups<f64> {
    let (Some(group), Some(numeric)) = (resolve(table, group_column), resolve_numeric(table, numeric_column))
    else {
        return Groups::new();
    };
    let mut sums: Groups<(f64, usize)> = Groups::new();
    for record in table.records() {
        let (Some(key), Some(number)) = (
            record.value_at(group),
            record.value_at(numeric).and_then(Value::as_number),
        ) else {
            continue;
        };
        let (sum, count) = sums.entry(key, || (0.0, 0));
        *sum += number;
        *count += 1;
    }
    sums.map(|(sum, count)| (count > 0).then(|| sum / count as f64))
}

/// Share of records whose `column` equals `value`, in `[0, 1]`; `0.0` for an empty table.
pub fn rate(table: &Table, column: &str, value: impl Into<Value>) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let value = value.into();
    let Some(index) = resolve(table, column) else {
        return 0.0;
    };
    let matching = table
        .records()
        .iter()
        .filter(|record| record.value_at(index).is_some_and(|candidate| candidate.matches(&value)))
        .count();
    matching as f64 / table.len() as f64
}

/// Mean of the numeric values of `column`; `None` when there are none.
pub fn mean(table: &Table, column: &str) -> Option<f64> {
    let index = resolve_numeric(table, column)?;
    let numbers: Vec<f64> = table
        .records()
        .iter()
        .filter_map(|record| record.value_at(index).and_then(Value::as_number))
        .collect();
    if numbers.is_empty() {
        None
    } else {
        Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
    }
}

/// Distinct non-empty values of `column`, in first-seen order (dropdown options).
pub fn distinct(table: &Table, column: &str) -> Vec<Value> {
    group_count(table, column)
        .into_iter()
        .map(|(value, _)| value)
        .filter(|value| !value.is_empty())
        .collect()
}

/// Stable sort by `column`; empty cells always go last.
pub fn sort_by(table: &Table, column: &str, order: SortOrder) -> Table {
    let Some(index) = resolve(table, column) else {
        return table.clone();
    };
    let mut records = table.records().to_vec();
    records.sort_by(|left, right| {
        let left = left.value_at(index).cloned().unwrap_or_default();
        let right = right.value_at(index).cloned().unwrap_or_default();
        match (left.is_empty(), right.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ordering = compare(&left, &right);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            }
        }
    });
    table.with_records(records)
}

/// Numbers before dates before text; like kinds compare naturally.
fn compare(left: &Value, right: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Number(_) => 0,
            Value::Date(_) => 1,
            _ => 2,
        }
    }
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.partial_cmp(right).unwrap_or(Ordering::Equal),
        (Value::Date(left), Value::Date(right)) => left.cmp(right),
        (Value::Text(left), Value::Text(right)) => left.to_lowercase().cmp(&right.to_lowercase()),
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::{Column, ColumnType};

    fn clients() -> Table {
        Table::from_rows(&["id", "city"], &[&["C001", "Cairo"], &["C002", "Giza"]])
    }

    fn complaints() -> Table {
        Table::from_rows(
            &["id", "category", "status", "resolution_days"],
            &[
                &["P1", "Billing", "Resolved", "2"],
                &["P2", "Delivery", "Open", ""],
                &["P3", "Billing", "Resolved", "4"],
                &["P4", "Delivery", "Pending", "n/a"],
                &["P5", "Damage", "Open", "7"],
            ],
        )
    }

    fn calls() -> Table {
        let mut table = Table::new(vec![
            Column::new("id", ColumnType::Text),
            Column::new("call_date", ColumnType::Date),
            Column::new("duration_minutes", ColumnType::Number),
        ]);
        let day = |d| Value::Date(NaiveDate::from_ymd_opt(2024, 5, d).unwrap());
        table.push_values(vec![Value::from("K1"), day(1), Value::Number(4.0)]);
        table.push_values(vec![Value::from("K2"), Value::from("01/05/2024"), Value::Number(6.0)]);
        table.push_values(vec![Value::from("K3"), Value::from("someday"), Value::Empty]);
        table.push_values(vec![Value::from("K4"), day(2), Value::Number(12.5)]);
        table
    }

    fn ids(table: &Table) -> Vec<String> {
        table
            .records()
            .iter()
            .map(|record| record.get("id").map(Value::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn filter_equals_keeps_matching_rows() {
        let filtered = filter_equals(&clients(), "city", "Giza");
        assert_eq!(filtered, Table::from_rows(&["id", "city"], &[&["C002", "Giza"]]));
    }

    #[test]
    fn filter_equals_all_is_identity() {
        for table in [clients(), complaints(), calls(), Table::from_rows(&["id"], &[])] {
            assert_eq!(filter_equals(&table, "city", Selection::All), table);
            assert_eq!(filter_equals(&table, "id", ALL), table);
        }
    }

    #[test]
    fn filter_equals_matches_numbers_loosely() {
        let filtered = filter_equals(&calls(), "duration_minutes", "6");
        assert_eq!(ids(&filtered), vec!["K2"]);
    }

    #[test]
    fn filter_on_unknown_column_is_empty() {
        let filtered = filter_equals(&clients(), "region", "Giza");
        assert!(filtered.is_empty());
        assert_eq!(filtered.columns(), clients().columns());
    }

    #[test]
    fn filter_contains_ignores_case_by_default() {
        let table = clients();
        assert_eq!(ids(&filter_contains(&table, "city", "CAI", false)), vec!["C001"]);
        assert!(filter_contains(&table, "city", "CAI", true).is_empty());
        assert_eq!(filter_contains(&table, "city", "", true), table);
        assert_eq!(ids(&filter_contains(&table, "id", "00", false)), vec!["C001", "C002"]);
    }

    #[test]
    fn group_count_in_first_seen_order() {
        let table = complaints();
        let groups = group_count(&table, "category");
        let keys: Vec<String> = groups.keys().map(Value::to_string).collect();
        assert_eq!(keys, vec!["Billing", "Delivery", "Damage"]);
        assert_eq!(groups.get(&Value::from("Delivery")), Some(&2));
        assert_eq!(groups.values().sum::<usize>(), table.len());
    }

    #[test]
    fn group_count_sums_to_table_length() {
        for (table, column) in [(complaints(), "status"), (calls(), "call_date"), (clients(), "id")] {
            assert_eq!(group_count(&table, column).values().sum::<usize>(), table.len());
        }
        assert!(group_count(&clients(), "missing").is_empty());
    }

    #[test]
    fn group_count_over_many_distinct_ids() {
        let ids: Vec<String> = (0..5000).map(|n| format!("C{:05}", n)).collect();
        let mut table = Table::from_rows(&["id"], &[]);
        for id in ids.iter().chain(ids.iter().take(100)) {
            table.push_values(vec![Value::from(id.as_str())]);
        }
        let groups = group_count(&table, "id");
        assert_eq!(groups.len(), 5000);
        assert_eq!(groups.get(&Value::from("C00042")), Some(&2));
        assert_eq!(groups.get(&Value::from("C04999")), Some(&1));
        assert_eq!(distinct(&table, "id").len(), 5000);
        assert_eq!(distinct(&table, "id")[0], Value::from("C00000"));
    }

    #[test]
    fn group_mean_skips_groups_without_numbers() {
        let table = Table::from_rows(
            &["agent", "duration"],
            &[&["Hany", "4"], &["Hany", "8"], &["Laila", ""], &["Omar", "x"], &["Laila", "3"], &["Nour", ""]],
        );
        let means = group_mean(&table, "agent", "duration");
        assert_eq!(means.len(), 2);
        assert_eq!(means.get(&Value::from("Hany")), Some(&6.0));
        assert_eq!(means.get(&Value::from("Laila")), Some(&3.0));
        assert_eq!(means.get(&Value::from("Omar")), None);
        assert_eq!(means.get(&Value::from("Nour")), None);
    }

    #[test]
    fn group_mean_over_empty_or_wrong_columns() {
        assert!(group_mean(&Table::from_rows(&["a", "b"], &[]), "a", "b").is_empty());
        assert!(group_mean(&calls(), "id", "call_date").is_empty());
        assert!(group_mean(&calls(), "id", "missing").is_empty());
    }

    #[test]
    fn rate_of_resolved_complaints() {
        assert_eq!(rate(&complaints(), "status", "Resolved"), 0.4);
        assert_eq!(rate(&complaints(), "status", "Escalated"), 0.0);
    }

    #[test]
    fn rate_of_empty_table_is_zero() {
        let empty = Table::from_rows(&["status"], &[]);
        assert_eq!(rate(&empty, "status", "Resolved"), 0.0);
        assert_eq!(rate(&empty, "missing", 1.0), 0.0);
    }

    #[test]
    fn date_equals_ignores_unparsable_values() {
        let first_of_may = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(ids(&date_equals(&calls(), "call_date", first_of_may)), vec!["K1", "K2"]);
        assert!(date_equals(&calls(), "duration_minutes", first_of_may).is_empty());
    }

    #[test]
    fn criteria_apply_conjunctively() {
        let table = complaints();
        let narrowed = apply(
            &table,
            &[
                FilterCriterion::equals("category", "Billing"),
                FilterCriterion::equals("status", ALL),
                FilterCriterion::contains("id", "p3"),
            ],
        );
        assert_eq!(ids(&narrowed), vec!["P3"]);
        assert_eq!(apply(&table, &[]), table);
    }

    #[test]
    fn transforms_compose() {
        let table = complaints();
        let open = filter_equals(&table, "status", "Open");
        assert_eq!(group_count(&open, "category").len(), 2);
        assert_eq!(mean(&open, "resolution_days"), Some(7.0));
    }

    #[test]
    fn mean_and_distinct() {
        assert_eq!(mean(&calls(), "duration_minutes"), Some((4.0 + 6.0 + 12.5) / 3.0));
        assert_eq!(mean(&clients(), "city"), None);
        let amounts = Table::from_rows(&["amount"], &[&["1,200"], &["800"]]);
        assert_eq!(mean(&amounts, "amount"), Some(1000.0));
        assert_eq!(
            distinct(&complaints(), "status"),
            vec![Value::from("Resolved"), Value::from("Open"), Value::from("Pending")]
        );
    }

    #[test]
    fn sort_keeps_empty_last() {
        let by_duration = sort_by(&calls(), "duration_minutes", SortOrder::Desc);
        assert_eq!(ids(&by_duration), vec!["K4", "K2", "K1", "K3"]);
        let by_status = sort_by(&complaints(), "status", SortOrder::Asc);
        assert_eq!(ids(&by_status), vec!["P2", "P5", "P4", "P1", "P3"]);
        assert_eq!(sort_by(&clients(), "missing", SortOrder::Asc), clients());
    }
}
