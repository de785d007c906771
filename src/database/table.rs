use crate::database::column::Column;
use crate::database::value::Value;

/// One table row, with a value for every column of the owning table.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at a 0-based column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Represents a typed table read from a sheet or copied from another table.
///
/// Cloning copies every row, so a copy never shares storage with its source.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Table name, unique within a store
    name: String,
    /// Column definitions
    columns: Vec<Column>,
    /// Rows in sheet order
    rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        Self {
            name: name.to_owned(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Appends a row. Only the sheet reader appends rows.
    ///
    /// # Panics
    /// Panics if the record does not have one value per column.
    pub(crate) fn push(&mut self, record: Record) {
        assert_eq!(record.values.len(), self.columns.len(), "record width must match the table columns");
        self.rows.push(record);
    }

    /// Returns the 0-based position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Returns the value of the named column in a 0-based row.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Removes every row, keeping the columns.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::ColumnType;

    fn sales() -> Table {
        let mut table = Table::new("Sales", vec![
            Column::new("Name", ColumnType::String),
            Column::new("Qty", ColumnType::Int32),
        ]);
        table.push(Record::new(vec![Value::String("Widget".to_owned()), Value::Int32(10)]));
        table.push(Record::new(vec![Value::String("Gadget".to_owned()), Value::Int32(5)]));
        table
    }

    #[test]
    fn lookup_by_column_name() {
        let table = sales();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("Qty"), Some(1));
        assert_eq!(table.value(1, "Name"), Some(&Value::String("Gadget".to_owned())));
        assert_eq!(table.value(0, "Qty").and_then(Value::as_i32), Some(10));
        assert_eq!(table.value(0, "Price"), None);
        assert_eq!(table.value(2, "Qty"), None);
    }

    #[test]
    fn clone_is_independent() {
        let source = sales();
        let mut copy = source.clone();
        copy.clear();
        copy.set_name("Backup");

        assert_eq!(source.len(), 2);
        assert_eq!(source.name(), "Sales");
        assert!(copy.is_empty());
        assert_eq!(copy.columns(), source.columns());
    }

    #[test]
    #[should_panic(expected = "record width")]
    fn push_rejects_misaligned_records() {
        let mut table = sales();
        table.push(Record::new(vec![Value::Int32(1)]));
    }
}
