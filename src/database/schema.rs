use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::error::SheetDatasetError;
use regex::Regex;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to column schema construction and parsing.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Column schema is empty")]
    EmptySchema,

    #[error("Duplicate column '{0}' in schema")]
    DuplicateColumn(String),

    #[error("Unknown column type '{0}'")]
    UnknownColumnType(String),

    #[error("Invalid schema entry '{0}', expected 'Name=B:type'")]
    InvalidEntry(String),
}

/// Maps one output column to a source column label and a target type.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSchemaEntry {
    /// Name of the column in the produced table
    pub output_name: String,
    /// Spreadsheet column label, e.g. "B" or "AA"
    pub source_column: String,
    /// Type each cell is coerced to
    pub column_type: ColumnType,
}

impl ColumnSchemaEntry {
    pub fn new(output_name: &str, source_column: &str, column_type: ColumnType) -> Self {
        Self {
            output_name: output_name.to_owned(),
            source_column: source_column.to_owned(),
            column_type,
        }
    }
}

impl FromStr for ColumnSchemaEntry {
    type Err = SheetDatasetError;

    /// Parses the `Name=B:type` form, e.g. "Qty=B:int".
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let pattern = Regex::new(r"^\s*([^=]*[^=\s])\s*=\s*([A-Za-z]+)\s*:\s*(\w+)\s*$").expect("Hardcode regex pattern");
        let captures = pattern
            .captures(value)
            .ok_or(SchemaError::InvalidEntry(value.to_owned()))?;
        let field = |index: usize| captures.get(index).map(|matcher| matcher.as_str()).unwrap_or_default();
        Ok(ColumnSchemaEntry::new(field(1), field(2), ColumnType::parse(field(3))?))
    }
}

/// Ordered column mapping used to read a sheet into a table.
///
/// A schema is never empty and its output names are unique. The first entry
/// is the anchor: reading stops at the first row whose anchor cell is empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSchema {
    entries: Vec<ColumnSchemaEntry>,
}

impl ColumnSchema {
    /// Creates a schema, rejecting empty entry lists and duplicate output names.
    pub fn new(entries: Vec<ColumnSchemaEntry>) -> Result<Self, SheetDatasetError> {
        if entries.is_empty() {
            Err(SchemaError::EmptySchema)?;
        }
        let mut names = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !names.insert(entry.output_name.as_str()) {
                Err(SchemaError::DuplicateColumn(entry.output_name.to_owned()))?;
            }
        }
        Ok(Self { entries })
    }

    /// Starts an empty builder.
    pub fn builder() -> ColumnSchemaBuilder {
        ColumnSchemaBuilder::default()
    }

    /// Returns the anchor entry.
    pub fn anchor(&self) -> &ColumnSchemaEntry {
        &self.entries[0]
    }

    pub fn entries(&self) -> &[ColumnSchemaEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSchemaEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, kept for the `len` pairing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the table columns this schema produces, in order.
    pub fn columns(&self) -> Vec<Column> {
        self.entries
            .iter()
            .map(|entry| Column::new(&entry.output_name, entry.column_type))
            .collect()
    }
}

impl FromStr for ColumnSchema {
    type Err = SheetDatasetError;

    /// Parses comma or semicolon separated entries, e.g. "Name=A:string, Qty=B:int".
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let entries = value
            .split([',', ';'])
            .filter(|entry| !entry.trim().is_empty())
            .map(ColumnSchemaEntry::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        ColumnSchema::new(entries)
    }
}

/// Collects schema entries in code.
#[derive(Default, Debug)]
pub struct ColumnSchemaBuilder {
    entries: Vec<ColumnSchemaEntry>,
}

impl ColumnSchemaBuilder {
    pub fn column(mut self, output_name: &str, source_column: &str, column_type: ColumnType) -> Self {
        self.entries.push(ColumnSchemaEntry::new(output_name, source_column, column_type));
        self
    }

    pub fn build(self) -> Result<ColumnSchema, SheetDatasetError> {
        ColumnSchema::new(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_entry() {
        let entry: ColumnSchemaEntry = " Unit Price = c : double ".parse().unwrap();
        assert_eq!(entry, ColumnSchemaEntry::new("Unit Price", "c", ColumnType::Float64));
    }

    #[test]
    fn parse_invalid_entries() {
        for value in ["Qty", "Qty=B", "Qty=B2:int", "=B:int", "Qty=:int"] {
            assert!(matches!(
                value.parse::<ColumnSchemaEntry>(),
                Err(SheetDatasetError::SchemaError(SchemaError::InvalidEntry(_)))
            ), "{value}");
        }
        assert!(matches!(
            "Qty=B:money".parse::<ColumnSchemaEntry>(),
            Err(SheetDatasetError::SchemaError(SchemaError::UnknownColumnType(_)))
        ));
    }

    #[test]
    fn parse_schema() {
        let schema: ColumnSchema = "Name=A:string, Qty=B:int; When=AA:datetime".parse().unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.anchor().output_name, "Name");
        assert_eq!(
            schema.columns(),
            vec![
                Column::new("Name", ColumnType::String),
                Column::new("Qty", ColumnType::Int32),
                Column::new("When", ColumnType::DateTime),
            ]
        );
    }

    #[test]
    fn builder_rejects_invalid_schemas() {
        assert!(matches!(
            ColumnSchema::builder().build(),
            Err(SheetDatasetError::SchemaError(SchemaError::EmptySchema))
        ));
        assert!(matches!(
            ColumnSchema::builder()
                .column("Name", "A", ColumnType::String)
                .column("Name", "B", ColumnType::Int32)
                .build(),
            Err(SheetDatasetError::SchemaError(SchemaError::DuplicateColumn(name))) if name == "Name"
        ));
        assert!(matches!(
            "".parse::<ColumnSchema>(),
            Err(SheetDatasetError::SchemaError(SchemaError::EmptySchema))
        ));
    }
}
