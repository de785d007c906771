use crate::database::table::Table;
use thiserror::Error;

/// Errors related to table lookup.
#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("Table '{0}' not found")]
    NotFound(String),
}

/// Named collection of tables in insertion order.
///
/// Names are unique and compared case-sensitively. Expected absence and name
/// clashes are reported as `false` rather than as errors.
#[derive(Clone, Debug, Default)]
pub struct TableStore {
    tables: Vec<Table>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. Returns false and leaves the store unchanged if the name is taken.
    pub fn add(&mut self, table: Table) -> bool {
        if self.contains(table.name()) {
            log::debug!("Table '{}' already exists", table.name());
            return false;
        }
        self.tables.push(table);
        true
    }

    /// Removes a table. Returns false if it does not exist.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.tables.remove(index);
                true
            }
            None => false,
        }
    }

    /// Adds a deep copy of `source` named `destination`.
    ///
    /// Returns false if `source` does not exist or `destination` is taken.
    pub fn copy(&mut self, source: &str, destination: &str) -> bool {
        if self.contains(destination) {
            return false;
        }
        let Some(index) = self.position(source) else {
            return false;
        };
        let mut table = self.tables[index].clone();
        table.set_name(destination);
        self.tables.push(table);
        true
    }

    /// Renames a table in place.
    ///
    /// Returns false if `old_name` does not exist or another table is named
    /// `new_name`. Renaming a table to its own name succeeds.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        let Some(index) = self.position(old_name) else {
            return false;
        };
        if old_name != new_name && self.contains(new_name) {
            return false;
        }
        self.tables[index].set_name(new_name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Result<&Table, StoreError> {
        self.tables
            .iter()
            .find(|table| table.name() == name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table, StoreError> {
        self.tables
            .iter_mut()
            .find(|table| table.name() == name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }

    /// Returns the table names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|table| table.name() == name)
    }
}
