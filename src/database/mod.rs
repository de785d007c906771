//! # Typed Tables
//!
//! The in-memory side of the bridge: column types, the schema that maps sheet
//! columns to table columns, cell coercion, tables and the named store that
//! owns them.
pub mod column;
pub mod schema;
pub mod store;
pub mod table;
pub mod value;

pub use column::Column;
pub use column::ColumnType;
pub use schema::ColumnSchema;
pub use schema::ColumnSchemaEntry;
pub use store::TableStore;
pub use table::Record;
pub use table::Table;
pub use value::coerce;
pub use value::Value;
