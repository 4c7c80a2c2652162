use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::column::TableName;
use crate::database::record::Record;
use crate::database::value::Value;
use crate::error::TransformError;

/// Represents a table fetched from one worksheet, or derived from one by a transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Source worksheet, if any
    pub name: Option<TableName>,
    /// Column definitions, in header order
    columns: Vec<Column>,
    /// Rows in source order
    records: Vec<Record>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            name: None,
            columns,
            records: Vec::new(),
        }
    }

    /// Creates an empty table carrying the declared schema of `name`.
    pub fn empty(name: TableName) -> Self {
        Self {
            name: Some(name),
            columns: name.schema(),
            records: Vec::new(),
        }
    }

    /// Builds a table of text columns from literal rows; handy for fixtures.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let columns = headers
            .iter()
            .map(|header| Column::new(header, ColumnType::Text))
            .collect();
        let mut table = Self::new(columns);
        for row in rows {
            table.push_values(row.iter().map(|cell| Value::from(*cell)).collect());
        }
        table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column, or a typed error when the table has no such column.
    pub fn column_index(&self, name: &str) -> Result<usize, TransformError> {
        self.columns
            .iter()
            .position(|column| column.name == name)
            .ok_or_else(|| TransformError::UnknownColumn(name.to_owned()))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Appends a row given as values in column order.
    /// Short rows are padded with `Empty`, extra values are dropped.
    pub fn push_values(&mut self, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Empty);
        let record = self
            .columns
            .iter()
            .map(|column| column.name.clone())
            .zip(values)
            .collect();
        self.records.push(record);
    }

    /// Appends a record, laying its fields out in column order.
    /// Fields the table does not declare are ignored; missing fields become `Empty`.
    pub fn push(&mut self, record: &Record) {
        let values = self
            .columns
            .iter()
            .map(|column| record.get(&column.name).cloned().unwrap_or_default())
            .collect();
        self.push_values(values);
    }

    /// Same columns, a chosen subset of rows.
    pub(crate) fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            name: self.name,
            columns: self.columns.clone(),
            records,
        }
    }
}
