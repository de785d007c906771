//! Format helpers shared by the spreadsheet engine.
pub(crate) mod xml;
pub(crate) mod zip;
