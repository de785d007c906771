use crate::error::SheetDatasetError;
use crate::spreadsheet::reference::index_to_reference;
use chrono::NaiveDate;
use chrono::TimeDelta;
use std::fmt::Display;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 1/0
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Text values, shared strings are resolved on load
    InlineString,
    /// Formula results that failed (#N/A, #DIV/0!, ...)
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Looks for date and time tokens outside of literals, escapes and colors.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single cell in a worksheet with position, type, and raw value.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
    /// Cell data type
    pub kind: CellType,
    /// Raw cell value as stored in the document
    pub value: String,
    /// Style index into the workbook's cell formats, kept for saving
    pub style: Option<usize>,
}

impl Cell {
    /// Creates a text cell at 0-based position.
    pub fn text(row: usize, col: usize, value: &str) -> Self {
        Self {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
            style: None,
        }
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Returns true if the cell holds no value.
    pub fn is_empty(&self) -> bool {
        self.kind == CellType::Empty || self.value.is_empty()
    }

    /// Renders the cell the way a user sees it.
    ///
    /// Date/time formatted numbers become ISO strings, booleans become
    /// `true`/`false`, everything else is the raw value. Numbers that do not
    /// parse under a date/time format fall back to the raw value.
    pub fn display_value(&self) -> String {
        let rendered = match self.kind {
            CellType::Boolean => Ok(if self.value == "1" || self.value.eq_ignore_ascii_case("true") { "true" } else { "false" }.to_owned()),
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false),
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true),
            CellType::NumberDate1900 => to_date_string(&self.value, false),
            CellType::NumberDate1904 => to_date_string(&self.value, true),
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value),
            CellType::IsoDateTime => Ok(self.value.replace('T', " ")),
            _ => Ok(self.value.to_owned()),
        };
        rendered.unwrap_or_else(|_| self.value.to_owned())
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_value())
    }
}

/// Converts Excel numeric date to ISO date string.
/// Handles Lotus 1-2-3 leap year bug for 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, SheetDatasetError> {
    let out_of_range = || SheetDatasetError::WithContextError(format!("date serial '{}' out of range", value));
    let days = parse_number(value)?.trunc();
    if !days.is_finite() {
        return Err(out_of_range());
    }
    let days = days as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = days
        .checked_add(offset)
        .and_then(TimeDelta::try_days)
        .and_then(|duration| NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal").checked_add_signed(duration))
        .ok_or_else(out_of_range)?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional day part of an Excel number to an ISO time string.
fn to_time_string(value: &str) -> Result<String, SheetDatasetError> {
    let factor = parse_number(value)?.fract();
    let mut hours = (factor * 86_400_000f64).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(timestamp)
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, SheetDatasetError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

fn parse_number(value: &str) -> Result<f64, SheetDatasetError> {
    value.trim().parse::<f64>().map_err(|_| {
        SheetDatasetError::WithContextError(format!("parse '{}' to number failed", value))
    })
}
