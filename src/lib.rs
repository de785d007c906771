//! # Spreadsheet Datasets
//!
//! Reads rectangular regions of spreadsheet sheets into typed in-memory tables
//! and writes tables back as new sheets.
//!
//! ## Features
//!
//! - **Typed columns**: every column is declared with a [`ColumnType`] and each
//!   cell is coerced to it; a cell that does not fit fails the whole read with
//!   the sheet name and cell reference
//! - **Anchor column scan**: rows are read from a start row down to the first
//!   empty cell in the schema's first column
//! - **Table store**: tables are kept by name and can be copied, renamed and
//!   deleted
//! - **Excel workbooks**: `.xlsx` and `.xlsm` files are read and written with
//!   shared strings, date formats and both date systems handled
//!
//! ## Example
//!
//! ```no_run
//! use sheet_dataset::ColumnSchema;
//! use sheet_dataset::Session;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), sheet_dataset::SheetDatasetError> {
//! let schema: ColumnSchema = "Name=A:string, Qty=B:int".parse()?;
//! let mut session: Session = Session::open(Path::new("orders.xlsx"))?;
//! session.read_sheet("Orders", 2, &schema)?;
//! session.copy_table("Orders", "Archive");
//! session.write_table("Archive")?;
//! session.close_workbook(true)?;
//! # Ok(())
//! # }
//! ```
pub mod database;
pub mod error;
mod helpers;
pub mod session;
pub mod spreadsheet;

pub use database::Column;
pub use database::ColumnSchema;
pub use database::ColumnSchemaEntry;
pub use database::ColumnType;
pub use database::Record;
pub use database::Table;
pub use database::TableStore;
pub use database::Value;
pub use error::SheetDatasetError;
pub use session::Session;
pub use spreadsheet::Sheet;
pub use spreadsheet::Spreadsheet;
pub use spreadsheet::XlsxSpreadsheet;
