use thiserror::Error;

/// Main error type for the crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum SheetDatasetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    ReferenceError(#[from] crate::spreadsheet::reference::ReferenceError),

    // Database module errors
    #[error("{0}")]
    CoerceError(#[from] crate::database::value::CoerceError),

    #[error("{0}")]
    SchemaError(#[from] crate::database::schema::SchemaError),

    #[error("{0}")]
    StoreError(#[from] crate::database::store::StoreError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetDatasetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetDatasetError::WithContextError(format!("{}: {}", message, e)))
    }
}
