use crate::database::schema::ColumnSchema;
use crate::database::table::Record;
use crate::database::table::Table;
use crate::database::value::coerce;
use crate::error::SheetDatasetError;
use crate::spreadsheet::reference::column_index;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::SpreadsheetError;

/// Reads a sheet into a table named after it.
///
/// Rows are read from `start_row` (1-based) down to the first row whose
/// anchor cell, the first schema column, is missing or empty. Rows after that
/// gap are never read, even if other columns still hold data. Missing cells in
/// the other columns read as the empty string.
///
/// The read is all or nothing: the first cell that fails coercion aborts it
/// with [`SpreadsheetError::CellValueError`] naming the sheet and cell.
pub fn read_sheet(sheet: &Sheet, start_row: usize, schema: &ColumnSchema) -> Result<Table, SheetDatasetError> {
    if start_row == 0 {
        Err(SpreadsheetError::InvalidRowError(start_row))?;
    }
    let columns = schema
        .iter()
        .map(|entry| column_index(&entry.source_column))
        .collect::<Result<Vec<usize>, _>>()?;
    let anchor = columns[0];

    let mut table = Table::new(sheet.name(), schema.columns());
    for row in start_row.. {
        if display_value(sheet, row, anchor).is_empty() {
            break;
        }
        let mut values = Vec::with_capacity(columns.len());
        for (entry, &col) in schema.iter().zip(&columns) {
            let raw = display_value(sheet, row, col);
            let value = coerce(&raw, entry.column_type).map_err(|error| {
                SpreadsheetError::CellValueError(
                    sheet.name().to_owned(),
                    index_to_reference(row - 1, col - 1),
                    error.to_string(),
                )
            })?;
            values.push(value);
        }
        table.push(Record::new(values));
    }
    log::debug!("Read {} row(s) from sheet '{}'", table.len(), sheet.name());
    Ok(table)
}

fn display_value(sheet: &Sheet, row: usize, col: usize) -> String {
    sheet
        .read_cell(row, col)
        .map(|cell| cell.display_value())
        .unwrap_or_default()
}
