use crate::database::table::Table;
use crate::database::value::Value;
use chrono::NaiveDate;

/// Dropdown text standing for "no filter".
pub const ALL: &str = "All";

/// A dropdown choice: everything, or one value.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    All,
    Only(Value),
}

impl Selection {
    /// Returns true if `value` passes this selection.
    pub fn accept(&self, value: &Value) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => value.matches(expected),
        }
    }
}

impl From<&str> for Selection {
    /// The `All` sentinel (any case) selects everything; other text selects itself.
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(ALL) {
            Selection::All
        } else {
            Selection::Only(Value::from(value))
        }
    }
}

impl From<&Selection> for Selection {
    fn from(value: &Selection) -> Self {
        value.clone()
    }
}

impl From<Value> for Selection {
    fn from(value: Value) -> Self {
        Selection::Only(value)
    }
}

/// One condition narrowing a table.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterCriterion {
    /// Column value equals the selection.
    Equals { column: String, selection: Selection },
    /// Column text contains a substring.
    Contains {
        column: String,
        substring: String,
        case_sensitive: bool,
    },
    /// Column, read as a date, falls on the given day.
    OnDate { column: String, date: NaiveDate },
}

impl FilterCriterion {
    pub fn equals(column: &str, selection: impl Into<Selection>) -> Self {
        FilterCriterion::Equals {
            column: column.to_owned(),
            selection: selection.into(),
        }
    }

    pub fn contains(column: &str, substring: &str) -> Self {
        FilterCriterion::Contains {
            column: column.to_owned(),
            substring: substring.to_owned(),
            case_sensitive: false,
        }
    }

    pub fn on_date(column: &str, date: NaiveDate) -> Self {
        FilterCriterion::OnDate {
            column: column.to_owned(),
            date,
        }
    }

    /// Narrows `table` by this criterion alone.
    pub fn apply(&self, table: &Table) -> Table {
        match self {
            FilterCriterion::Equals { column, selection } => super::filter_equals(table, column, selection),
            FilterCriterion::Contains {
                column,
                substring,
                case_sensitive,
            } => super::filter_contains(table, column, substring, *case_sensitive),
            FilterCriterion::OnDate { column, date } => super::date_equals(table, column, *date),
        }
    }
}

/// Applies every criterion in turn (logical AND).
pub fn apply(table: &Table, criteria: &[FilterCriterion]) -> Table {
    criteria
        .iter()
        .fold(table.clone(), |narrowed, criterion| criterion.apply(&narrowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_ignores_case() {
        assert_eq!(Selection::from("All"), Selection::All);
        assert_eq!(Selection::from(" all "), Selection::All);
        assert_eq!(Selection::from("Allison"), Selection::Only(Value::from("Allison")));
        assert!(Selection::All.accept(&Value::Empty));
    }

    #[test]
    fn single_criterion_narrows() {
        let table = Table::from_rows(&["id", "driver"], &[&["K1", "Samir"], &["K2", "Mona"]]);
        let narrowed = FilterCriterion::equals("driver", "Mona").apply(&table);
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed.records()[0].get("id"), Some(&Value::from("K2")));

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(FilterCriterion::on_date("driver", date).apply(&table).is_empty());
    }
}
