use crate::database::table::Table;
use crate::error::SheetDatasetError;
use crate::spreadsheet::validate_sheet_name;
use crate::spreadsheet::Spreadsheet;

/// Writes a table into a new sheet named after it.
///
/// Every value is written as its display string at the 1-based position
/// `(row + 1, column + 1)`; no header row is written. Returns false without
/// creating a sheet if the workbook already has a sheet with the table's name,
/// and fails with [`SpreadsheetError::InvalidSheetNameError`] if the name is
/// not a valid sheet name.
///
/// [`SpreadsheetError::InvalidSheetNameError`]: crate::spreadsheet::SpreadsheetError::InvalidSheetNameError
pub fn write_table<S: Spreadsheet>(table: &Table, workbook: &mut S) -> Result<bool, SheetDatasetError> {
    validate_sheet_name(table.name())?;
    if workbook.contains_sheet(table.name()) {
        log::warn!("Sheet '{}' already exists in '{}'", table.name(), workbook.name());
        return Ok(false);
    }

    let sheet = workbook.create_sheet();
    sheet.set_name(table.name());
    for (row, record) in table.rows().iter().enumerate() {
        for (col, value) in record.values().iter().enumerate() {
            sheet.write_cell(row + 1, col + 1, &value.to_string());
        }
    }
    log::debug!("Wrote {} row(s) to sheet '{}'", table.len(), table.name());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::Column;
    use crate::database::column::ColumnType;
    use crate::database::table::Record;
    use crate::database::value::Value;
    use crate::spreadsheet::SpreadsheetError;
    use crate::spreadsheet::XlsxSpreadsheet;

    fn orders() -> Table {
        let mut table = Table::new("Orders", vec![
            Column::new("Name", ColumnType::String),
            Column::new("Qty", ColumnType::Int32),
            Column::new("Paid", ColumnType::Boolean),
        ]);
        table.push(Record::new(vec![Value::String("Widget".to_owned()), Value::Int32(10), Value::Boolean(true)]));
        table.push(Record::new(vec![Value::String("Gadget".to_owned()), Value::Int32(5), Value::Boolean(false)]));
        table
    }

    #[test]
    fn writes_display_strings() {
        let mut workbook = XlsxSpreadsheet::new();
        assert!(write_table(&orders(), &mut workbook).unwrap());

        assert_eq!(workbook.sheet_names(), vec!["Orders"]);
        let sheet = workbook.sheet("Orders").unwrap();
        let values: Vec<String> = sheet.cells().map(|cell| cell.to_string()).collect();
        assert_eq!(values, vec!["Widget", "10", "true", "Gadget", "5", "false"]);
        assert_eq!(sheet.read_cell(2, 2).map(|cell| cell.reference()), Some("B2".to_owned()));
    }

    #[test]
    fn rejects_invalid_sheet_names() {
        let mut workbook = XlsxSpreadsheet::new();
        let mut table = orders();
        table.set_name("Q1/Q2 [draft]: totals for the whole year");

        assert!(matches!(
            write_table(&table, &mut workbook),
            Err(SheetDatasetError::SpreadsheetError(SpreadsheetError::InvalidSheetNameError(_)))
        ));
        assert!(workbook.sheet_names().is_empty());
    }

    #[test]
    fn refuses_existing_sheet() {
        let mut workbook = XlsxSpreadsheet::new();
        workbook.create_sheet().set_name("ORDERS");

        assert!(!write_table(&orders(), &mut workbook).unwrap());
        assert_eq!(workbook.sheet_names(), vec!["ORDERS"]);
        assert!(workbook.sheet("ORDERS").unwrap().is_empty());
    }
}
