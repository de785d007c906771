//! # Session
//!
//! A [`Session`] ties one [`TableStore`] to at most one open workbook. Sheets
//! are read into the store with [`Session::read_sheet`], stored tables are
//! written back as new sheets with [`Session::write_table`], and the store
//! operations are available by table name.
//!
//! The workbook is released exactly once: by [`Session::close_workbook`] or,
//! without saving, when the session is dropped.
pub mod reader;
pub mod writer;

use crate::database::schema::ColumnSchema;
use crate::database::store::TableStore;
use crate::error::SheetDatasetError;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::XlsxSpreadsheet;
use std::path::Path;

/// Owns a table store and an optional open workbook.
#[derive(Debug)]
pub struct Session<S: Spreadsheet = XlsxSpreadsheet> {
    store: TableStore,
    workbook: Option<S>,
}

impl<S: Spreadsheet> Session<S> {
    /// Creates a session with an empty store and no workbook.
    pub fn new() -> Self {
        Self {
            store: TableStore::new(),
            workbook: None,
        }
    }

    /// Creates a session and opens the workbook at `path`.
    pub fn open(path: &Path) -> Result<Self, SheetDatasetError> {
        let mut session = Self::new();
        session.open_workbook(path)?;
        Ok(session)
    }

    /// Creates a session around an already opened workbook.
    pub fn from_workbook(workbook: S) -> Self {
        Self {
            store: TableStore::new(),
            workbook: Some(workbook),
        }
    }

    /// Opens the workbook at `path`. Returns false if one is already open.
    pub fn open_workbook(&mut self, path: &Path) -> Result<bool, SheetDatasetError> {
        if let Some(workbook) = &self.workbook {
            log::warn!("Workbook '{}' is already open", workbook.name());
            return Ok(false);
        }
        self.workbook = Some(S::open(path)?);
        Ok(true)
    }

    /// Closes the open workbook, saving it first if `save` is set.
    ///
    /// Returns false if no workbook is open. The workbook is released even
    /// when saving fails.
    pub fn close_workbook(&mut self, save: bool) -> Result<bool, SheetDatasetError> {
        match self.workbook.take() {
            Some(workbook) => {
                workbook.close(save)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.workbook.is_some()
    }

    pub fn workbook(&self) -> Option<&S> {
        self.workbook.as_ref()
    }

    pub fn workbook_mut(&mut self) -> Option<&mut S> {
        self.workbook.as_mut()
    }

    /// Reads a sheet of the open workbook into a table named after the sheet.
    ///
    /// Returns false if no workbook is open or it has no sheet with this
    /// exact name. Returns true once the table is in the store, including
    /// when a table of that name was already there, in which case nothing is
    /// read. See [`reader::read_sheet`] for the row scan; on error the store
    /// is left unchanged.
    pub fn read_sheet(&mut self, sheet_name: &str, start_row: usize, schema: &ColumnSchema) -> Result<bool, SheetDatasetError> {
        let Some(workbook) = self.workbook.as_ref() else {
            return Ok(false);
        };
        let Some(sheet) = workbook.sheet(sheet_name) else {
            log::debug!("Sheet '{}' not found in '{}'", sheet_name, workbook.name());
            return Ok(false);
        };
        if self.store.contains(sheet.name()) {
            log::debug!("Table '{}' already loaded, skipping read", sheet.name());
            return Ok(true);
        }
        let table = reader::read_sheet(sheet, start_row, schema)?;
        self.store.add(table);
        Ok(true)
    }

    /// Writes a stored table into a new sheet of the open workbook.
    ///
    /// Returns false if no workbook is open, the table does not exist, or the
    /// workbook already has a sheet with the table's name.
    pub fn write_table(&mut self, table_name: &str) -> Result<bool, SheetDatasetError> {
        let Some(workbook) = self.workbook.as_mut() else {
            return Ok(false);
        };
        match self.store.get(table_name) {
            Ok(table) => writer::write_table(table, workbook),
            Err(error) => {
                log::debug!("{}", error);
                Ok(false)
            }
        }
    }

    /// Removes a table. Returns false if it does not exist.
    pub fn delete_table(&mut self, name: &str) -> bool {
        self.store.remove(name)
    }

    /// Copies a table under a new name. See [`TableStore::copy`].
    pub fn copy_table(&mut self, source: &str, destination: &str) -> bool {
        self.store.copy(source, destination)
    }

    /// Renames a table. See [`TableStore::rename`].
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> bool {
        self.store.rename(old_name, new_name)
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TableStore {
        &mut self.store
    }

    /// Releases the workbook without saving and returns the tables.
    pub fn into_store(mut self) -> TableStore {
        std::mem::take(&mut self.store)
    }
}

impl<S: Spreadsheet> Default for Session<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Spreadsheet> Drop for Session<S> {
    fn drop(&mut self) {
        if let Some(workbook) = self.workbook.take() {
            log::debug!("Releasing workbook '{}' without saving", workbook.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::ColumnType;
    use crate::database::value::Value;
    use crate::spreadsheet::Sheet;

    fn workbook() -> XlsxSpreadsheet {
        let mut workbook = XlsxSpreadsheet::new();
        let sheet = workbook.create_sheet();
        sheet.set_name("Orders");
        for (row, (name, qty)) in [("Name", "Qty"), ("Widget", "10"), ("Gadget", "5")].iter().enumerate() {
            sheet.write_cell(row + 1, 1, name);
            sheet.write_cell(row + 1, 2, qty);
        }
        workbook
    }

    fn schema() -> ColumnSchema {
        "Name=A:string, Qty=B:int".parse().unwrap()
    }

    #[test]
    fn read_sheet_into_store() {
        let mut session = Session::from_workbook(workbook());
        assert!(session.read_sheet("Orders", 2, &schema()).unwrap());

        let table = session.store().get("Orders").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "Name"), Some(&Value::String("Widget".to_owned())));
        assert_eq!(table.value(0, "Qty"), Some(&Value::Int32(10)));
        assert_eq!(table.value(1, "Name"), Some(&Value::String("Gadget".to_owned())));
        assert_eq!(table.value(1, "Qty"), Some(&Value::Int32(5)));
    }

    #[test]
    fn read_sheet_skips_loaded_tables() {
        let mut session = Session::from_workbook(workbook());
        assert!(session.read_sheet("Orders", 2, &schema()).unwrap());
        session.workbook_mut().unwrap().sheet_mut("Orders").unwrap().write_cell(4, 1, "Gizmo");
        session.workbook_mut().unwrap().sheet_mut("Orders").unwrap().write_cell(4, 2, "1");

        assert!(session.read_sheet("Orders", 2, &schema()).unwrap());
        assert_eq!(session.store().get("Orders").unwrap().len(), 2);
    }

    #[test]
    fn read_sheet_without_workbook_or_sheet() {
        let mut session: Session = Session::new();
        assert!(!session.read_sheet("Orders", 2, &schema()).unwrap());

        let mut session = Session::from_workbook(workbook());
        assert!(!session.read_sheet("orders", 2, &schema()).unwrap());
        assert!(!session.read_sheet("Missing", 2, &schema()).unwrap());
        assert!(session.store().is_empty());
    }

    #[test]
    fn failed_read_leaves_store_unchanged() {
        let mut session = Session::from_workbook(workbook());
        let schema = ColumnSchema::builder()
            .column("Name", "A", ColumnType::String)
            .column("Qty", "B", ColumnType::Boolean)
            .build()
            .unwrap();

        assert!(session.read_sheet("Orders", 2, &schema).is_err());
        assert!(!session.store().contains("Orders"));
    }

    #[test]
    fn write_table_to_new_sheet() {
        let mut session = Session::from_workbook(workbook());
        session.read_sheet("Orders", 2, &schema()).unwrap();

        assert!(!session.write_table("Orders").unwrap());
        assert!(!session.write_table("Missing").unwrap());
        assert!(session.rename_table("Orders", "Archive"));
        assert!(session.write_table("Archive").unwrap());

        let sheet: &Sheet = session.workbook().unwrap().sheet("Archive").unwrap();
        assert_eq!(sheet.read_cell(1, 1).map(|cell| cell.to_string()), Some("Widget".to_owned()));
        assert_eq!(sheet.read_cell(2, 2).map(|cell| cell.to_string()), Some("5".to_owned()));
    }

    #[test]
    fn table_operations() {
        let mut session = Session::from_workbook(workbook());
        session.read_sheet("Orders", 2, &schema()).unwrap();

        assert!(session.copy_table("Orders", "Backup"));
        assert!(!session.copy_table("Orders", "Backup"));
        assert!(!session.rename_table("Backup", "Orders"));
        assert!(session.delete_table("Orders"));
        assert!(!session.delete_table("Orders"));

        let store = session.into_store();
        assert_eq!(store.names(), vec!["Backup"]);
        assert_eq!(store.get("Backup").unwrap().len(), 2);
    }

    #[test]
    fn close_workbook_once() {
        let mut session = Session::from_workbook(workbook());
        assert!(session.is_open());
        assert!(session.close_workbook(false).unwrap());
        assert!(!session.is_open());
        assert!(!session.close_workbook(false).unwrap());
        assert!(!session.write_table("Orders").unwrap());
    }
}
