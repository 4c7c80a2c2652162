use crate::database::column::ColumnType;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::borrow::Cow;
use std::fmt::Display;

/// Date layouts accepted from text cells, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y"];

/// Datetime layouts whose date part is kept.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y/%m/%d %H:%M:%S"];

/// A single scalar stored in a record.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    /// Converts raw cell text into the declared column type.
    /// Text that does not fit the type is kept as `Text`.
    pub fn parse_as(text: &str, kind: ColumnType) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Value::Empty;
        }
        match kind {
            ColumnType::Number => parse_number(text)
                .map(Value::Number)
                .unwrap_or_else(|| Value::Text(text.to_owned())),
            ColumnType::Date => parse_date(text)
                .map(Value::Date)
                .unwrap_or_else(|| Value::Text(text.to_owned())),
            ColumnType::Text | ColumnType::Category => Value::Text(text.to_owned()),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the value; numeric text counts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => parse_number(text),
            _ => None,
        }
    }

    /// Date view of the value; text in a known date layout counts.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(date) => Some(*date),
            Value::Text(text) => parse_date(text),
            _ => None,
        }
    }

    /// Equality across the store's native representations:
    /// `Text("3")` matches `Number(3.0)` and `Text("2024-05-01")` matches the same `Date`.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(left), Value::Text(right)) if left == right => true,
            _ => self.canonical() == other.canonical(),
        }
    }

    /// Form under which loosely equal values coincide.
    /// Numeric text becomes a number and date text a date; other text is trimmed.
    pub(crate) fn canonical(&self) -> Canonical<'_> {
        match self {
            Value::Empty => Canonical::Empty,
            Value::Number(number) => Canonical::number(*number),
            Value::Date(date) => Canonical::Date(*date),
            Value::Text(text) => {
                let text = text.trim();
                if let Some(number) = parse_number(text) {
                    Canonical::number(number)
                } else if let Some(date) = parse_date(text) {
                    Canonical::Date(date)
                } else if text.is_empty() {
                    Canonical::Empty
                } else {
                    Canonical::Text(Cow::Borrowed(text))
                }
            }
        }
    }
}

/// Hashable key of a [`Value`], see [`Value::canonical`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Canonical<'a> {
    Empty,
    Number(u64),
    Date(NaiveDate),
    Text(Cow<'a, str>),
}

impl Canonical<'_> {
    fn number(number: f64) -> Self {
        // -0.0 and 0.0 share a key
        Canonical::Number((number + 0.0).to_bits())
    }

    pub(crate) fn into_owned(self) -> Canonical<'static> {
        match self {
            Canonical::Empty => Canonical::Empty,
            Canonical::Number(bits) => Canonical::Number(bits),
            Canonical::Date(date) => Canonical::Date(date),
            Canonical::Text(text) => Canonical::Text(Cow::Owned(text.into_owned())),
        }
    }
}

/// Parses numeric cell text; thousands separators are ignored.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let number = if text.contains(',') {
        text.replace(',', "").parse::<f64>()
    } else {
        text.parse::<f64>()
    };
    number.ok().filter(|number| number.is_finite())
}

/// Parses a date from the layouts a sheet user is likely to type.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(text) => write!(f, "{}", text),
            Value::Number(number) => write!(f, "{}", format_number(*number)),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Value::Empty
        } else {
            Value::Text(value.to_owned())
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::from(value.as_str())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}
