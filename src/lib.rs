//! # Sheet Records
//!
//! A record store for a customer-service operation, kept in a Google spreadsheet.
//! Each worksheet is a table of clients, calls, complaints or pickups; this crate
//! reads them into typed tables, appends and edits records, and provides the
//! filters and aggregates behind a dashboard.
//!
//! ## Features
//!
//! - **Explicit connections**: [`connect`] returns a [`ConnectionHandle`] owning the
//!   authenticated service; every operation takes it as an argument
//! - **Typed schemas**: each [`TableName`] declares its columns, so dates, numbers and
//!   categories come back as [`Value`]s rather than raw text
//! - **Degrading reads**: [`read_table`] yields an empty table plus a diagnostic when the
//!   spreadsheet is unreachable, while [`try_read_table`] reports the failure
//! - **Pure transforms**: filters, grouping and rates in [`transforms`] never touch the network
//! - **Pluggable backends**: the Google Sheets v4 REST API, or [`MemorySheets`] for tests
//!   and offline work
//!
//! ## Example
//!
//! ```no_run
//! use sheet_records::{connect_from_env, read_table, transforms, TableName};
//!
//! let handle = connect_from_env()?;
//! let complaints = read_table(&handle, TableName::Complaints).table;
//! let resolved = transforms::rate(&complaints, "status", "Resolved");
//! println!("{:.0}% resolved", resolved * 100.0);
//! # Ok::<(), anyhow::Error>(())
//! ```
pub mod config;
pub mod database;
pub mod error;
pub mod spreadsheet;
pub mod store;
pub mod transforms;

pub use config::{connect_from_env, StoreConfig};
pub use database::{Column, ColumnType, Record, Table, TableName, Value};
pub use error::{ConnectionError, FetchError, SheetRecordsError, TransformError};
pub use spreadsheet::{GoogleSheets, MemorySheets, SheetService};
pub use store::{
    append_record, connect, connect_with, disconnect, read_table, try_read_table, update_cell, worksheet_titles,
    ConnectionHandle, ReadOutcome,
};
