//! Spreadsheet cell addressing.
//!
//! Column labels are bijective base-26 numerals: the digits `A`..`Z` carry the
//! values 1..26 and there is no zero digit, so `Z` is 26 and `AA` is 27.

use thiserror::Error;

/// Errors related to column labels and cell references.
#[derive(Error, Debug, PartialEq)]
pub enum ReferenceError {
    #[error("Invalid column label '{0}'")]
    InvalidColumnLabel(String),
}

/// Converts a column label (e.g. "A", "az", "XFD") to its 1-based column index.
///
/// Labels are case-insensitive and may be of any length. Empty labels, labels
/// with characters outside `A`..`Z`, and labels too long to fit in `usize` fail
/// with [`ReferenceError::InvalidColumnLabel`].
pub fn column_index(label: &str) -> Result<usize, ReferenceError> {
    let invalid = || ReferenceError::InvalidColumnLabel(label.to_owned());
    if label.is_empty() {
        return Err(invalid());
    }
    label.chars().try_fold(0usize, |index, char| {
        if !char.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = (char.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        index
            .checked_mul(26)
            .and_then(|index| index.checked_add(digit))
            .ok_or_else(invalid)
    })
}

/// Converts a 1-based column index back to its label. Returns an empty string for 0.
pub fn index_to_column(index: usize) -> String {
    let mut column = index;
    let mut label = String::new();
    while column > 0 {
        column -= 1;
        label.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    label
}

/// Converts 0-based row and column indexes to an A1-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_column(col + 1), row + 1)
}

/// Converts an A1-style reference to 0-based (row, column) indexes.
/// Returns None when the reference is malformed.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|char: char| char.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = column_index(letters).ok()?;
    let row = digits.parse::<usize>().ok().filter(|row| *row > 0)?;
    Some((row - 1, col - 1))
}
