use std::fmt::Display;

/// Semantic type of a column, declared per table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Free text
    Text,
    /// Integer or floating point numbers
    Number,
    /// Calendar date without time
    Date,
    /// Text drawn from a small set of values (filter dropdowns)
    Category,
}

impl ColumnType {
    /// Returns the string representation of the column type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Category => "category",
        }
    }

    /// Returns true if this column type holds date values.
    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(self, ColumnType::Date)
    }

    /// Returns true if this column type holds textual values.
    #[inline]
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Category)
    }
}

/// Represents a column in a table with name and data type.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Column name (from header row)
    pub name: String,
    /// Column data type
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: &str, kind: ColumnType) -> Self {
        Self {
            name: name.to_owned(),
            kind,
        }
    }
}

/// The four worksheets managed by the dashboard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableName {
    Clients,
    Calls,
    Complaints,
    Pickups,
}

impl TableName {
    pub const ALL: [TableName; 4] = [
        TableName::Clients,
        TableName::Calls,
        TableName::Complaints,
        TableName::Pickups,
    ];

    /// Title of the worksheet backing this table.
    pub const fn worksheet(&self) -> &'static str {
        match self {
            TableName::Clients => "Clients",
            TableName::Calls => "Calls",
            TableName::Complaints => "Complaints",
            TableName::Pickups => "Pickups",
        }
    }

    /// Declared columns of the worksheet, in the order the sheet is laid out.
    pub fn schema(&self) -> Vec<Column> {
        use ColumnType::*;
        let columns: &[(&str, ColumnType)] = match self {
            TableName::Clients => &[
                ("id", Text),
                ("name", Text),
                ("phone", Text),
                ("city", Category),
                ("registered_on", Date),
            ],
            TableName::Calls => &[
                ("id", Text),
                ("client_id", Text),
                ("agent", Category),
                ("call_date", Date),
                ("duration_minutes", Number),
                ("outcome", Category),
            ],
            TableName::Complaints => &[
                ("id", Text),
                ("client_id", Text),
                ("category", Category),
                ("status", Category),
                ("opened_on", Date),
                ("resolution_days", Number),
            ],
            TableName::Pickups => &[
                ("id", Text),
                ("client_id", Text),
                ("address", Text),
                ("pickup_date", Date),
                ("driver", Category),
                ("status", Category),
            ],
        };
        columns
            .iter()
            .map(|(name, kind)| Column::new(name, *kind))
            .collect()
    }

    /// Declared type of a column, if the schema names it.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.schema()
            .into_iter()
            .find(|column| column.name == name)
            .map(|column| column.kind)
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.worksheet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_has_an_id_column() {
        for table in TableName::ALL {
            let schema = table.schema();
            assert_eq!(schema[0].name, "id", "{table}");
            assert_eq!(schema[0].kind, ColumnType::Text);
        }
    }

    #[test]
    fn column_types_are_declared() {
        assert_eq!(TableName::Calls.column_type("call_date"), Some(ColumnType::Date));
        assert_eq!(
            TableName::Complaints.column_type("resolution_days"),
            Some(ColumnType::Number)
        );
        assert_eq!(TableName::Clients.column_type("status"), None);
    }
}
