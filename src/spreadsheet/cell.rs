use crate::database::column::ColumnType;
use crate::database::value::{format_number, Value};
use chrono::Duration;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;

/// A cell as the spreadsheet service returns it, before schema typing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawCell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl RawCell {
    /// Converts a JSON cell from an unformatted values response.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => RawCell::Empty,
            JsonValue::Bool(value) => RawCell::Boolean(*value),
            JsonValue::Number(number) => number.as_f64().map(RawCell::Number).unwrap_or_default(),
            JsonValue::String(text) if text.is_empty() => RawCell::Empty,
            JsonValue::String(text) => RawCell::Text(text.to_owned()),
            other => RawCell::Text(other.to_string()),
        }
    }

    /// JSON form used in write requests.
    pub fn to_json(&self) -> JsonValue {
        match self {
            RawCell::Empty => JsonValue::String(String::new()),
            RawCell::Text(text) => JsonValue::String(text.to_owned()),
            RawCell::Number(number) => serde_json::Number::from_f64(*number)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(number.to_string())),
            RawCell::Boolean(value) => JsonValue::Bool(*value),
        }
    }

    /// Text shown in the sheet for this cell.
    pub fn as_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(text) => text.to_owned(),
            RawCell::Number(number) => format_number(*number),
            RawCell::Boolean(value) => if *value { "TRUE" } else { "FALSE" }.to_owned(),
        }
    }

    /// Types the cell according to its declared column type.
    /// Numbers in a date column are read as serial dates (1900 epoch).
    pub fn to_value(&self, kind: ColumnType) -> Value {
        match (self, kind) {
            (RawCell::Empty, _) => Value::Empty,
            (RawCell::Number(number), ColumnType::Number) => Value::Number(*number),
            (RawCell::Number(number), ColumnType::Date) => serial_to_date(*number)
                .map(Value::Date)
                .unwrap_or(Value::Number(*number)),
            (RawCell::Text(text), kind) => Value::parse_as(text, kind),
            (cell, _) => Value::Text(cell.as_text()),
        }
    }
}

impl From<&Value> for RawCell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Empty => RawCell::Empty,
            Value::Text(text) => RawCell::Text(text.to_owned()),
            Value::Number(number) => RawCell::Number(*number),
            Value::Date(date) => RawCell::Text(date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Largest serial a spreadsheet can hold (9999-12-31).
pub const MAX_SERIAL: f64 = 2_958_465.0;

/// Converts a serial day number (days since 1899-12-30) to a date.
/// Serials outside the spreadsheet date range give `None`.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal");
    base.checked_add_signed(Duration::try_days(serial.trunc() as i64)?)
}
