//! # Spreadsheet Engine
//!
//! The boundary to the spreadsheet document. A [`Spreadsheet`] is an opened
//! workbook: it lists and hands out [`Sheet`]s, creates new ones, and saves
//! the document back to where it came from. Sheets are plain in-memory cell
//! grids, so the table reader and writer never touch the file format.
//!
//! [`XlsxSpreadsheet`] is the engine for Office Open XML workbooks.
pub mod cell;
pub(crate) mod excel;
pub mod reference;
pub mod sheet;
pub mod xlsx;

pub use cell::Cell;
pub use cell::CellType;
pub use sheet::Sheet;
pub use xlsx::XlsxSpreadsheet;

use crate::error::SheetDatasetError;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the spreadsheet engine and by cell conversion.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported spreadsheet file '{0}'")]
    UnsupportedFileError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Missing part '{0}' in spreadsheet")]
    FileError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Spreadsheet '{0}' has no file to save to")]
    MissingPathError(String),

    #[error("Invalid sheet name '{0}'")]
    InvalidSheetNameError(String),

    #[error("Invalid row number {0}, rows start at 1")]
    InvalidRowError(usize),

    #[error("Invalid cell value in sheet '{0}' at {1}: {2}")]
    CellValueError(String, String, String),
}

/// An opened spreadsheet document.
///
/// Opening acquires the document, [`Spreadsheet::close`] releases it. Dropping
/// an opened value also releases it without saving.
pub trait Spreadsheet: Sized {
    /// Opens the document at `path`.
    fn open(path: &Path) -> Result<Self, SheetDatasetError>;

    /// Returns the document name, usually its file path.
    fn name(&self) -> String;

    /// Returns the sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Returns the sheet with exactly this name.
    fn sheet(&self, name: &str) -> Option<&Sheet>;

    /// Returns the sheet with exactly this name for writing.
    fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet>;

    /// Appends a new empty sheet with a generated name. Callers rename it.
    fn create_sheet(&mut self) -> &mut Sheet;

    /// Writes the document back to its file.
    fn save(&mut self) -> Result<(), SheetDatasetError>;

    /// Returns true if a sheet has this name. Sheet names are compared
    /// case-insensitively, as spreadsheet applications do.
    fn contains_sheet(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.sheet_names()
            .iter()
            .any(|sheet_name| sheet_name.to_lowercase() == name)
    }

    /// Saves if requested, then releases the document.
    fn close(mut self, save: bool) -> Result<(), SheetDatasetError> {
        if save {
            self.save()?;
        }
        log::debug!("Closed spreadsheet '{}'", self.name());
        Ok(())
    }
}

/// Longest sheet name spreadsheet applications accept
const MAX_SHEET_NAME_LENGTH: usize = 31;

/// Checks a sheet name against the rules spreadsheet applications enforce:
/// 1 to 31 characters, none of `[ ] : * ? / \`, no leading or trailing
/// apostrophe, and not the reserved name `History`.
pub fn validate_sheet_name(name: &str) -> Result<(), SpreadsheetError> {
    let length = name.chars().count();
    let is_valid = (1..=MAX_SHEET_NAME_LENGTH).contains(&length)
        && !name.contains(['[', ']', ':', '*', '?', '/', '\\'])
        && !name.starts_with('\'')
        && !name.ends_with('\'')
        && !name.eq_ignore_ascii_case("history");
    if is_valid {
        Ok(())
    } else {
        Err(SpreadsheetError::InvalidSheetNameError(name.to_owned()))
    }
}

/// Generates a sheet name not used by `names`: Sheet1, Sheet2, ...
pub(crate) fn unused_sheet_name(names: &[String]) -> String {
    (1..)
        .map(|index| format!("Sheet{index}"))
        .find(|candidate| !names.iter().any(|name| name.eq_ignore_ascii_case(candidate)))
        .expect("Unbounded sheet name candidates")
}
