//! # Record Store
//!
//! Treats a spreadsheet as a small multi-table database keyed by [`TableName`].
//! Every operation takes an explicit [`ConnectionHandle`]; remote failures come
//! back as typed errors and reads can degrade to an empty table.
use crate::database::column::{Column, ColumnType, TableName};
use crate::database::record::Record;
use crate::database::table::Table;
use crate::database::value::Value;
use crate::error::{ConnectionError, FetchError};
use crate::spreadsheet::auth::ServiceAccountKey;
use crate::spreadsheet::cell::RawCell;
use crate::spreadsheet::google::{GoogleOptions, GoogleSheets};
use crate::spreadsheet::{SheetService, SpreadsheetId};
use log::{debug, info, warn};
use std::fmt::Debug;

/// One live session against the backing spreadsheet.
///
/// Owns the service (and its credentials) until dropped or passed to [`disconnect`].
pub struct ConnectionHandle {
    service: Box<dyn SheetService>,
    label: String,
}

impl Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle").field("label", &self.label).finish()
    }
}

impl ConnectionHandle {
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Result of a degrading read: the table to render and, when the fetch failed, why.
#[derive(Debug)]
pub struct ReadOutcome {
    pub table: Table,
    pub diagnostic: Option<FetchError>,
}

impl ReadOutcome {
    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Connects to a Google spreadsheet with a service-account key (JSON text)
/// and a spreadsheet URL or id, using default transport options.
pub fn connect(credentials: &str, spreadsheet: &str) -> Result<ConnectionHandle, ConnectionError> {
    connect_with_options(credentials, spreadsheet, GoogleOptions::default())
}

pub fn connect_with_options(
    credentials: &str,
    spreadsheet: &str,
    options: GoogleOptions,
) -> Result<ConnectionHandle, ConnectionError> {
    let key = ServiceAccountKey::from_json(credentials)?;
    let spreadsheet = SpreadsheetId::parse(spreadsheet)?;
    let label = format!("{} ({})", spreadsheet, key.client_email);
    let service = GoogleSheets::connect(key, spreadsheet, options)?;
    Ok(ConnectionHandle {
        service: Box::new(service),
        label,
    })
}

/// Wraps an already connected service.
pub fn connect_with(service: impl SheetService + 'static, label: &str) -> ConnectionHandle {
    info!("Using spreadsheet service '{}'", label);
    ConnectionHandle {
        service: Box::new(service),
        label: label.to_owned(),
    }
}

/// Ends a session; credentials and cached tokens are dropped with the handle.
pub fn disconnect(handle: ConnectionHandle) {
    info!("Disconnected from '{}'", handle.label);
}

/// Lists the workbook's worksheets.
pub fn worksheet_titles(handle: &ConnectionHandle) -> Result<Vec<String>, FetchError> {
    handle.service.worksheet_titles()
}

/// Reads a whole table; on failure returns an empty table with the declared
/// columns and the error as a diagnostic.
pub fn read_table(handle: &ConnectionHandle, name: TableName) -> ReadOutcome {
    match try_read_table(handle, name) {
        Ok(table) => ReadOutcome {
            table,
            diagnostic: None,
        },
        Err(error) => {
            warn!("Table '{}' unavailable: {}", name, error);
            ReadOutcome {
                table: Table::empty(name),
                diagnostic: Some(error),
            }
        }
    }
}

/// Reads a whole table, fresh from the service, in source row order.
pub fn try_read_table(handle: &ConnectionHandle, name: TableName) -> Result<Table, FetchError> {
    let rows = handle.service.read_rows(name.worksheet())?;
    let table = table_from_rows(name, rows)?;
    debug!("Read {} records from '{}'", table.len(), name);
    Ok(table)
}

/// Appends one record after the last row, laid out in header order.
/// Fields absent from the record are written empty; no uniqueness checks.
pub fn append_record(handle: &ConnectionHandle, name: TableName, record: &Record) -> Result<(), FetchError> {
    let worksheet = name.worksheet();
    let rows = handle.service.read_rows(worksheet)?;
    let header = header_names(worksheet, rows.first())?;
    if let Some(column) = record.columns().find(|column| !header.iter().any(|name| name == column)) {
        return Err(FetchError::UnknownColumn {
            worksheet: worksheet.to_owned(),
            column: column.to_owned(),
        });
    }
    let row = header
        .iter()
        .map(|column| record.get(column).map(RawCell::from).unwrap_or_default())
        .collect();
    handle.service.append_row(worksheet, row).inspect_err(|error| {
        warn!("Append to '{}' failed: {}", worksheet, error);
    })
}

/// Overwrites one cell. `row` and `col` are 1-based grid positions; row 1 is the header.
/// Positions outside the used grid are rejected before anything is written.
pub fn update_cell(
    handle: &ConnectionHandle,
    name: TableName,
    row: usize,
    col: usize,
    value: &Value,
) -> Result<(), FetchError> {
    let worksheet = name.worksheet();
    let rows = handle.service.read_rows(worksheet)?;
    let cols = header_names(worksheet, rows.first())?.len();
    if row == 0 || col == 0 || row > rows.len() || col > cols {
        return Err(FetchError::OutOfBounds {
            worksheet: worksheet.to_owned(),
            row,
            col,
            rows: rows.len(),
            cols,
        });
    }
    handle
        .service
        .write_cell(worksheet, row, col, RawCell::from(value))
        .inspect_err(|error| warn!("Update of '{}' ({}, {}) failed: {}", worksheet, row, col, error))
}

/// Grid row of the record at `position` in a freshly read table.
pub fn sheet_row(position: usize) -> usize {
    position + 2
}

/// Header names with trailing blanks trimmed, blanks named `column{n}` and
/// duplicates suffixed `_2`, `_3`, ...
fn header_names(worksheet: &str, header: Option<&Vec<RawCell>>) -> Result<Vec<String>, FetchError> {
    let header = header.ok_or_else(|| FetchError::MissingHeader(worksheet.to_owned()))?;
    let mut texts: Vec<String> = header.iter().map(|cell| cell.as_text().trim().to_owned()).collect();
    while texts.last().is_some_and(|text| text.is_empty()) {
        texts.pop();
    }
    if texts.is_empty() {
        return Err(FetchError::MissingHeader(worksheet.to_owned()));
    }
    let mut names: Vec<String> = Vec::with_capacity(texts.len());
    for (index, text) in texts.into_iter().enumerate() {
        let base = if text.is_empty() {
            warn!("Worksheet '{}' has a blank header in column {}", worksheet, index + 1);
            format!("column{}", index + 1)
        } else {
            text
        };
        let mut name = base.clone();
        let mut suffix = 2;
        while names.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    Ok(names)
}

/// Types a raw grid with the declared schema of `name`.
/// Every declared column must be present; undeclared columns are kept as text.
pub(crate) fn table_from_rows(name: TableName, rows: Vec<Vec<RawCell>>) -> Result<Table, FetchError> {
    let worksheet = name.worksheet();
    let header = header_names(worksheet, rows.first())?;

    let missing: Vec<String> = name
        .schema()
        .into_iter()
        .filter(|column| !header.contains(&column.name))
        .map(|column| column.name)
        .collect();
    if !missing.is_empty() {
        return Err(FetchError::MissingColumns {
            worksheet: worksheet.to_owned(),
            columns: missing,
        });
    }

    let columns: Vec<Column> = header
        .iter()
        .map(|title| {
            let kind = name.column_type(title).unwrap_or_else(|| {
                warn!("Worksheet '{}' has undeclared column '{}', reading it as text", worksheet, title);
                ColumnType::Text
            });
            Column::new(title, kind)
        })
        .collect();

    let mut table = Table::new(columns.clone());
    table.name = Some(name);
    for (position, row) in rows.iter().enumerate().skip(1) {
        let values = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let cell = row.get(index).cloned().unwrap_or_default();
                let value = cell.to_value(column.kind);
                if let (Value::Text(text), false) = (&value, column.kind.is_textual()) {
                    warn!(
                        "'{}' at {}!{} is not a {}, keeping it as text",
                        text,
                        worksheet,
                        crate::database::range::cell_reference(position + 1, index + 1),
                        column.kind.as_str()
                    );
                }
                value
            })
            .collect();
        table.push_values(values);
    }
    Ok(table)
}
