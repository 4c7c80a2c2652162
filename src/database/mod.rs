//! # Tabular Data Model
//!
//! Tables, records and values as handed to the dashboard, plus the declared
//! schema of every managed worksheet.
pub mod column;
pub mod range;
pub mod record;
pub mod table;
pub mod value;

pub use column::{Column, ColumnType, TableName};
pub use record::Record;
pub use table::Table;
pub use value::Value;
