use crate::database::schema::SchemaError;
use crate::error::SheetDatasetError;
use std::fmt::Display;
use std::str::FromStr;

/// Supported column data types for table values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Text, taken verbatim from the cell
    String,
    /// 32-bit signed integers
    Int32,
    /// Single-precision floating point numbers
    Float32,
    /// Double-precision floating point numbers
    Float64,
    /// Boolean values (true/false)
    Boolean,
    /// Date and time without time zone
    DateTime,
}

/// A column of a table with name and data type.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Column name, the output name of the schema entry
    pub name: String,
    /// Column data type
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: &str, kind: ColumnType) -> Self {
        Self {
            name: name.to_owned(),
            kind,
        }
    }
}

impl ColumnType {
    /// Returns the canonical name of the column type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int32 => "int32",
            ColumnType::Float32 => "float32",
            ColumnType::Float64 => "float64",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "datetime",
        }
    }

    /// Parses a column type from a string representation.
    /// Supports various aliases for each type.
    pub fn parse(name: &str) -> Result<Self, SheetDatasetError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "STRING" | "TEXT" | "VARCHAR" => Ok(Self::String),
            "INT" | "INT32" | "INTEGER" => Ok(Self::Int32),
            "FLOAT" | "FLOAT32" | "SINGLE" => Ok(Self::Float32),
            "DOUBLE" | "FLOAT64" => Ok(Self::Float64),
            "BOOL" | "BOOLEAN" => Ok(Self::Boolean),
            "DATETIME" | "TIMESTAMP" => Ok(Self::DateTime),
            _ => Err(SchemaError::UnknownColumnType(name.to_string()))?,
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = SheetDatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!(ColumnType::parse("text").unwrap(), ColumnType::String);
        assert_eq!(ColumnType::parse("Integer").unwrap(), ColumnType::Int32);
        assert_eq!(ColumnType::parse("single").unwrap(), ColumnType::Float32);
        assert_eq!(ColumnType::parse("DOUBLE").unwrap(), ColumnType::Float64);
        assert_eq!(ColumnType::parse(" bool ").unwrap(), ColumnType::Boolean);
        assert_eq!(ColumnType::parse("timestamp").unwrap(), ColumnType::DateTime);
    }

    #[test]
    fn parse_canonical_names() {
        for kind in [
            ColumnType::String,
            ColumnType::Int32,
            ColumnType::Float32,
            ColumnType::Float64,
            ColumnType::Boolean,
            ColumnType::DateTime,
        ] {
            assert_eq!(kind.to_string().parse::<ColumnType>().unwrap(), kind);
        }
    }

    #[test]
    fn parse_unknown_type() {
        assert!(matches!(
            ColumnType::parse("decimal"),
            Err(SheetDatasetError::SchemaError(SchemaError::UnknownColumnType(name))) if name == "decimal"
        ));
    }
}
