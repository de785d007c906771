//! Office Open XML package helpers shared by the workbook reader and writer
use crate::error::SheetDatasetError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlWriter;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

pub(crate) const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub(crate) const NS_SPREADSHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const REL_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub(crate) const CT_XML: &str = "application/xml";
pub(crate) const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub(crate) const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// XML tag names for relationship and content type parts
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_DEFAULT: &[u8] = b"Default";
const TAG_OVERRIDE: &[u8] = b"Override";

/// One entry of a `.rels` part
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Relationship {
    pub(crate) id: String,
    pub(crate) kind: String,
    /// Target normalized to a path inside the archive, or verbatim when external
    pub(crate) target: String,
    /// Whether the target points outside the package (`TargetMode="External"`)
    pub(crate) external: bool,
}

impl Relationship {
    pub(crate) fn is_worksheet(&self) -> bool {
        self.kind.ends_with("/worksheet")
    }

    pub(crate) fn is_calc_chain(&self) -> bool {
        self.kind.ends_with("/calcChain")
    }
}

/// `[Content_Types].xml` entries: extension defaults and part overrides
#[derive(Clone, Debug, Default)]
pub(crate) struct ContentTypes {
    pub(crate) defaults: Vec<(String, String)>,
    pub(crate) overrides: Vec<(String, String)>,
}

/// Loads every relationship of a `.rels` part, in document order
pub(crate) fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<Vec<Relationship>, SheetDatasetError> {
    let mut reader = match zip.xml_reader(path)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };
    let mut relationships = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            let external = event.get_attribute_value("TargetMode")?
                .is_some_and(|mode| mode.eq_ignore_ascii_case("External"));
            if let Some((id, target)) = id.zip(target) {
                relationships.push(Relationship {
                    id: id.to_string(),
                    kind: kind.map(|kind| kind.to_string()).unwrap_or_default(),
                    target: if external { target.to_string() } else { to_zip_path(target) },
                    external,
                });
            }
        }
    });
    Ok(relationships)
}

/// Loads `[Content_Types].xml`
pub(crate) fn load_content_types<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<ContentTypes, SheetDatasetError> {
    let mut content_types = ContentTypes::default();
    let mut reader = match zip.xml_reader("[Content_Types].xml")? {
        Some(reader) => reader,
        None => return Ok(content_types),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_DEFAULT => {
            let extension = event.get_attribute_value("Extension")?;
            let kind = event.get_attribute_value("ContentType")?;
            if let Some((extension, kind)) = extension.zip(kind) {
                content_types.defaults.push((extension.to_string(), kind.to_string()));
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_OVERRIDE => {
            let part = event.get_attribute_value("PartName")?;
            let kind = event.get_attribute_value("ContentType")?;
            if let Some((part, kind)) = part.zip(kind) {
                content_types.overrides.push((part.to_string(), kind.to_string()));
            }
        }
    });
    Ok(content_types)
}

/// Serializes a `.rels` part with archive-absolute targets, external targets verbatim
pub(crate) fn write_relationships(relationships: &[Relationship]) -> Result<Vec<u8>, SheetDatasetError> {
    let mut writer = XmlWriter::new()?;
    writer.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
    for relationship in relationships {
        let target = if relationship.external {
            relationship.target.to_owned()
        } else {
            format!("/{}", relationship.target)
        };
        let mut attributes = vec![
            ("Id", relationship.id.as_str()),
            ("Type", relationship.kind.as_str()),
            ("Target", target.as_str()),
        ];
        if relationship.external {
            attributes.push(("TargetMode", "External"));
        }
        writer.empty("Relationship", &attributes)?;
    }
    writer.end("Relationships")?;
    Ok(writer.into_inner())
}

/// Serializes `[Content_Types].xml`
pub(crate) fn write_content_types(content_types: &ContentTypes) -> Result<Vec<u8>, SheetDatasetError> {
    let mut writer = XmlWriter::new()?;
    writer.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    for (extension, kind) in &content_types.defaults {
        writer.empty("Default", &[("Extension", extension.as_str()), ("ContentType", kind.as_str())])?;
    }
    for (part, kind) in &content_types.overrides {
        writer.empty("Override", &[("PartName", part.as_str()), ("ContentType", kind.as_str())])?;
    }
    writer.end("Types")?;
    Ok(writer.into_inner())
}

/// Maps format indexes to cell types using custom and built-in formats
pub(crate) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the archive
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Checks for the compound file signature that encrypted Office packages use
pub(crate) fn is_password_protected(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
}
