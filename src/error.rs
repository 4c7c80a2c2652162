use thiserror::Error;

/// Failures while establishing a session against the backing spreadsheet.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The credential blob does not describe a usable service identity.
    #[error("Invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// The spreadsheet URL or id cannot be parsed.
    #[error("Invalid spreadsheet identifier '{0}'")]
    InvalidSpreadsheetId(String),

    /// The identity was rejected or cannot access the spreadsheet.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The spreadsheet does not exist.
    #[error("Spreadsheet '{0}' not found")]
    SpreadsheetNotFound(String),

    /// The service could not be reached.
    #[error("Spreadsheet service unreachable: {0}")]
    Unreachable(String),

    /// The service did not answer in time.
    #[error("Timed out while connecting")]
    Timeout,
}

/// Failures of a single read or write against a connected spreadsheet.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("Worksheet '{0}' has no header row")]
    MissingHeader(String),

    #[error("Worksheet '{worksheet}' is missing columns: {}", columns.join(", "))]
    MissingColumns {
        worksheet: String,
        columns: Vec<String>,
    },

    #[error("Worksheet '{worksheet}' has no column '{column}'")]
    UnknownColumn { worksheet: String, column: String },

    #[error("Cell ({row}, {col}) is outside '{worksheet}' ({rows} rows x {cols} columns)")]
    OutOfBounds {
        worksheet: String,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The session is stale or the access token was rejected.
    #[error("Session rejected: {0}")]
    Unauthorized(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Spreadsheet service unreachable: {0}")]
    Unreachable(String),

    #[error("Spreadsheet service answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Malformed input handed to a table transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("No column named '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' holds no numeric values")]
    NotNumeric(String),
}

/// Main error type for the crate.
/// Aggregates the record store taxonomy and the library errors met while configuring it.
#[derive(Error, Debug)]
pub enum SheetRecordsError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    UrlError(#[from] url::ParseError),

    // Record store errors
    #[error("{0}")]
    ConnectionError(#[from] ConnectionError),

    #[error("{0}")]
    FetchError(#[from] FetchError),

    #[error("{0}")]
    TransformError(#[from] TransformError),
}

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetRecordsError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetRecordsError::WithContextError(format!("{}: {}", message, e)))
    }
}
