//! # Spreadsheet Service Module
//!
//! The row-oriented protocol the record store speaks: read a worksheet's grid,
//! append a row, overwrite one cell. `GoogleSheets` speaks it over the Sheets
//! REST API; `MemorySheets` keeps an in-process workbook.
use crate::error::{ConnectionError, FetchError};
use regex::Regex;
use std::fmt::Display;
use url::Url;

pub mod auth;
pub mod cell;
pub mod google;
pub mod memory;

pub use cell::RawCell;
pub use google::GoogleSheets;
pub use memory::MemorySheets;

/// Backend seam of the record store.
///
/// Rows and columns are 1-based physical positions; row 1 is the header.
/// Implementations never panic on remote failures, they return a `FetchError`.
pub trait SheetService: Send + Sync {
    /// Titles of all worksheets in the workbook.
    fn worksheet_titles(&self) -> Result<Vec<String>, FetchError>;

    /// The used grid of a worksheet, header first. Trailing empty cells may be omitted.
    fn read_rows(&self, worksheet: &str) -> Result<Vec<Vec<RawCell>>, FetchError>;

    /// Appends one row after the last used row.
    fn append_row(&self, worksheet: &str, row: Vec<RawCell>) -> Result<(), FetchError>;

    /// Overwrites exactly one cell.
    fn write_cell(&self, worksheet: &str, row: usize, col: usize, value: RawCell) -> Result<(), FetchError>;
}

/// Opaque id of a spreadsheet, extracted from a share URL or given bare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadsheetId(String);

impl SpreadsheetId {
    /// Accepts `https://docs.google.com/spreadsheets/d/<id>/edit…` or a bare id.
    pub fn parse(identifier: &str) -> Result<Self, ConnectionError> {
        let identifier = identifier.trim();
        let bare = Regex::new(r"^[A-Za-z0-9_-]+$").expect("Hardcode regex pattern");
        if bare.is_match(identifier) {
            return Ok(Self(identifier.to_owned()));
        }
        let url = Url::parse(identifier)
            .map_err(|_| ConnectionError::InvalidSpreadsheetId(identifier.to_owned()))?;
        let in_path = Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("Hardcode regex pattern");
        in_path
            .captures(url.path())
            .and_then(|captures| captures.get(1))
            .map(|matcher| Self(matcher.as_str().to_owned()))
            .or_else(|| {
                url.query_pairs()
                    .find(|(key, _)| key == "key")
                    .map(|(_, value)| value.into_owned())
                    .filter(|value| bare.is_match(value))
                    .map(Self)
            })
            .ok_or_else(|| ConnectionError::InvalidSpreadsheetId(identifier.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SpreadsheetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
