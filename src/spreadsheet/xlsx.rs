use crate::error::ResultMessage;
use crate::error::SheetDatasetError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::xml::XmlWriter;
use crate::helpers::zip::write_package;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::ContentTypes;
use crate::spreadsheet::excel::Relationship;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::unused_sheet_name;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::BufRead;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use std::path::PathBuf;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

const PART_CONTENT_TYPES: &str = "[Content_Types].xml";
const PART_ROOT_RELATIONSHIPS: &str = "_rels/.rels";
const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELATIONSHIPS: &str = "xl/_rels/workbook.xml.rels";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const PART_STYLES: &str = "xl/styles.xml";

/// A worksheet together with its part path inside the package
#[derive(Debug)]
struct SheetPart {
    sheet: Sheet,
    path: String,
    /// Set once the sheet is created or handed out for writing. Only dirty
    /// sheets are regenerated on save, the others keep their loaded part.
    dirty: bool,
}

/// An Excel XLSX workbook held in memory between open and close.
///
/// Every worksheet is decoded into a [`Sheet`] on open. Saving regenerates the
/// workbook part, its relationships, the content types and the worksheets that
/// were created or borrowed mutably. Every other part of the loaded package,
/// untouched worksheets included, is copied unchanged.
#[derive(Debug)]
pub struct XlsxSpreadsheet {
    /// File name of the spreadsheet
    name: String,
    /// File the workbook is saved to
    path: Option<PathBuf>,
    /// Whether dates count from 1904 instead of 1900
    is_1904: bool,
    /// Worksheets in workbook order
    sheets: Vec<SheetPart>,
    /// Workbook relationships as loaded, worksheets included
    relationships: Vec<Relationship>,
    /// Content types as loaded
    content_types: ContentTypes,
    /// Raw package parts as loaded
    parts: Vec<(String, Vec<u8>)>,
}

impl XlsxSpreadsheet {
    /// Creates an empty workbook with no sheets and no file.
    pub fn new() -> XlsxSpreadsheet {
        XlsxSpreadsheet {
            name: String::new(),
            path: None,
            is_1904: false,
            sheets: Vec::new(),
            relationships: Vec::new(),
            content_types: ContentTypes::default(),
            parts: Vec::new(),
        }
    }

    /// Decodes a workbook from the bytes of an XLSX package.
    ///
    /// # Arguments
    /// * `name` - Name used in errors and logs
    /// * `bytes` - Package contents
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<XlsxSpreadsheet, SheetDatasetError> {
        if excel::is_password_protected(&bytes) {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(name.to_owned()))?;
        }

        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let content_types = excel::load_content_types(&mut zip)?;
        let relationships = excel::load_relationships(&mut zip, PART_WORKBOOK_RELATIONSHIPS)?;
        let (sheet_paths, is_1904) = load_workbook(&mut zip, &relationships)?;
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        let shared_strings = load_shared_strings(&mut zip)?;

        let mut sheets = Vec::with_capacity(sheet_paths.len());
        for (sheet_name, path) in sheet_paths {
            let sheet = read_sheet(&mut zip, &sheet_name, &path, &number_formats, &shared_strings)
                .with_prefix(&format!("Read sheet '{sheet_name}' failed"))?;
            sheets.push(SheetPart { sheet, path, dirty: false });
        }
        let parts = zip.entries()?;
        log::debug!("Loaded {} sheet(s) from '{}'", sheets.len(), name);

        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            path: None,
            is_1904,
            sheets,
            relationships,
            content_types,
            parts,
        })
    }

    /// Encodes the workbook as an XLSX package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SheetDatasetError> {
        if self.sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(self.name.to_owned()))?;
        }

        let calc_chains: Vec<&Relationship> = self.relationships.iter()
            .filter(|relationship| relationship.is_calc_chain())
            .collect();
        let is_sheet = |part: &str| self.sheets.iter().any(|sheet| part.eq_ignore_ascii_case(&sheet.path));
        let regenerated = |part: &str| {
            [PART_CONTENT_TYPES, PART_WORKBOOK, PART_WORKBOOK_RELATIONSHIPS].iter().any(|name| part.eq_ignore_ascii_case(name))
                || self.sheets.iter().any(|sheet| sheet.dirty && part.eq_ignore_ascii_case(&sheet.path))
                || calc_chains.iter().any(|relationship| part.eq_ignore_ascii_case(&relationship.target))
        };

        let mut relationships: Vec<Relationship> = self.sheets.iter()
            .enumerate()
            .map(|(index, part)| Relationship {
                id: format!("rId{}", index + 1),
                kind: excel::REL_WORKSHEET.to_owned(),
                target: part.path.to_owned(),
                external: false,
            })
            .collect();
        for relationship in &self.relationships {
            if !relationship.is_worksheet() && !relationship.is_calc_chain() {
                relationships.push(Relationship {
                    id: format!("rId{}", relationships.len() + 1),
                    ..relationship.clone()
                });
            }
        }

        let mut content_types = ContentTypes::default();
        content_types.defaults = self.content_types.defaults.clone();
        for (extension, kind) in [("rels", excel::CT_RELATIONSHIPS), ("xml", excel::CT_XML)] {
            if !content_types.defaults.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(extension)) {
                content_types.defaults.push((extension.to_owned(), kind.to_owned()));
            }
        }
        content_types.overrides = self.content_types.overrides.iter()
            .filter(|(part, _)| {
                let part = part.trim_start_matches('/');
                !regenerated(part) && !is_sheet(part)
            })
            .cloned()
            .collect();
        content_types.overrides.push((format!("/{PART_WORKBOOK}"), excel::CT_WORKBOOK.to_owned()));
        for part in &self.sheets {
            content_types.overrides.push((format!("/{}", part.path), excel::CT_WORKSHEET.to_owned()));
        }

        let mut parts: Vec<(String, Vec<u8>)> = Vec::with_capacity(self.parts.len() + self.sheets.len() + 4);
        parts.push((PART_CONTENT_TYPES.to_owned(), excel::write_content_types(&content_types)?));
        if !self.parts.iter().any(|(name, _)| name.eq_ignore_ascii_case(PART_ROOT_RELATIONSHIPS)) {
            let root = [Relationship {
                id: "rId1".to_owned(),
                kind: excel::REL_OFFICE_DOCUMENT.to_owned(),
                target: PART_WORKBOOK.to_owned(),
                external: false,
            }];
            parts.push((PART_ROOT_RELATIONSHIPS.to_owned(), excel::write_relationships(&root)?));
        }
        parts.push((PART_WORKBOOK.to_owned(), self.write_workbook()?));
        parts.push((PART_WORKBOOK_RELATIONSHIPS.to_owned(), excel::write_relationships(&relationships)?));
        for part in self.sheets.iter().filter(|part| part.dirty) {
            parts.push((part.path.to_owned(), write_sheet(&part.sheet)?));
        }
        for (name, bytes) in &self.parts {
            if !regenerated(name.as_str()) {
                parts.push((name.to_owned(), bytes.to_owned()));
            }
        }
        write_package(&parts)
    }

    /// Saves the workbook to `path` and makes it the file for later saves.
    pub fn save_as(&mut self, path: &Path) -> Result<(), SheetDatasetError> {
        self.path = Some(path.to_path_buf());
        self.name = path.to_string_lossy().to_string();
        self.save()
    }

    /// Writes `xl/workbook.xml`, with relationship ids matching `to_bytes`
    fn write_workbook(&self) -> Result<Vec<u8>, SheetDatasetError> {
        let mut writer = XmlWriter::new()?;
        writer.start("workbook", &[("xmlns", excel::NS_SPREADSHEET), ("xmlns:r", excel::NS_RELATIONSHIPS)])?;
        if self.is_1904 {
            writer.empty("workbookPr", &[("date1904", "1")])?;
        }
        writer.start("sheets", &[])?;
        for (index, part) in self.sheets.iter().enumerate() {
            let sheet_id = (index + 1).to_string();
            let relationship_id = format!("rId{}", index + 1);
            writer.empty("sheet", &[
                ("name", part.sheet.name()),
                ("sheetId", sheet_id.as_str()),
                ("r:id", relationship_id.as_str()),
            ])?;
        }
        writer.end("sheets")?;
        writer.end("workbook")?;
        Ok(writer.into_inner())
    }

    /// Picks a worksheet part path not used by any sheet or package part
    fn unused_sheet_path(&self) -> String {
        (1..)
            .map(|index| format!("xl/worksheets/sheet{index}.xml"))
            .find(|candidate| {
                !self.sheets.iter().any(|part| part.path.eq_ignore_ascii_case(candidate))
                    && !self.parts.iter().any(|(name, _)| name.eq_ignore_ascii_case(candidate))
            })
            .expect("Unbounded sheet path candidates")
    }
}

impl Default for XlsxSpreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    /// Opens an `.xlsx` or `.xlsm` file.
    ///
    /// The whole package is read into memory, so the file is not held open.
    fn open(path: &Path) -> Result<XlsxSpreadsheet, SheetDatasetError> {
        let name = path.to_string_lossy().to_string();
        match path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase).as_deref() {
            Some("xlsx") | Some("xlsm") => (),
            _ => Err(SpreadsheetError::UnsupportedFileError(name.to_owned()))?,
        }
        let bytes = std::fs::read(path)?;
        let mut spreadsheet = XlsxSpreadsheet::from_bytes(&name, bytes)?;
        spreadsheet.path = Some(path.to_path_buf());
        log::info!("Opened spreadsheet '{}'", name);
        Ok(spreadsheet)
    }

    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|part| part.sheet.name().to_owned()).collect()
    }

    fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter()
            .map(|part| &part.sheet)
            .find(|sheet| sheet.name() == name)
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        let part = self.sheets.iter_mut().find(|part| part.sheet.name() == name)?;
        part.dirty = true;
        Some(&mut part.sheet)
    }

    fn create_sheet(&mut self) -> &mut Sheet {
        let name = unused_sheet_name(&self.sheet_names());
        let path = self.unused_sheet_path();
        log::debug!("Created sheet '{}' at '{}'", name, path);
        self.sheets.push(SheetPart {
            sheet: Sheet::new(&name),
            path,
            dirty: true,
        });
        let index = self.sheets.len() - 1;
        &mut self.sheets[index].sheet
    }

    fn save(&mut self) -> Result<(), SheetDatasetError> {
        let path = self.path.to_owned()
            .ok_or_else(|| SpreadsheetError::MissingPathError(self.name.to_owned()))?;
        let bytes = self.to_bytes()?;
        std::fs::write(&path, bytes)?;
        log::info!("Saved spreadsheet '{}'", path.display());
        Ok(())
    }
}

/// Loads worksheet names and part paths from `xl/workbook.xml`
///
/// # Returns
/// Tuple of (worksheets, is_1904_date_system) where worksheets are (name, zip_path) pairs
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>, relationships: &[Relationship]) -> Result<(Vec<(String, String)>, bool), SheetDatasetError> {
    let mut reader = zip.xml_reader(PART_WORKBOOK)?
        .ok_or_else(|| SpreadsheetError::FileError(PART_WORKBOOK.to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                let relationship = relationships.iter()
                    .find(|relationship| relationship.id == id && relationship.is_worksheet());
                if let Some(relationship) = relationship {
                    sheets.push((name.to_string(), relationship.target.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads the cell type of every style index from `xl/styles.xml`
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellType>, SheetDatasetError> {
    let mut reader = match zip.xml_reader(PART_STYLES)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Loads the shared string table, phonetic runs excluded
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, SheetDatasetError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader(PART_SHARED_STRINGS)? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Decodes one worksheet part into a sheet
fn read_sheet<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    sheet_name: &str,
    path: &str,
    number_formats: &[CellType],
    shared_strings: &[String],
) -> Result<Sheet, SheetDatasetError> {
    let mut sheet = Sheet::new(sheet_name);
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut style = None::<usize>;
    let mut is_shared = false;
    let mut value = String::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            if let Some(number) = event.parse_attribute_value::<usize>("r")?.filter(|number| *number > 0) {
                row_count = number - 1;
            }
            col_count = 0;
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            style = event.parse_attribute_value::<usize>("s")?;
            is_shared = false;
            kind = match event.get_attribute_value("t")?.as_deref() {
                Some("inlineStr") | Some("str") => CellType::InlineString,
                Some("s") => {
                    is_shared = true;
                    CellType::InlineString
                }
                Some("d") => CellType::IsoDateTime,
                Some("b") => CellType::Boolean,
                Some("e") => CellType::Error,
                _ => style
                    .and_then(|index| number_formats.get(index))
                    .copied()
                    .unwrap_or(CellType::Number),
            };
            value.clear();
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_string_value(&mut reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL => {
            if is_shared {
                let index = value.trim().parse::<usize>()?;
                value = shared_strings.get(index).cloned().unwrap_or_default();
            }
            if !value.is_empty() {
                sheet.push(Cell {
                    row,
                    col,
                    kind,
                    value: std::mem::take(&mut value),
                    style,
                });
            }
        }
    });
    Ok(sheet)
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Skips phonetic text annotations and resolves entity references.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the string content
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether to treat the content as text by default
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SheetDatasetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

/// Writes one worksheet part. Empty cells are left out.
fn write_sheet(sheet: &Sheet) -> Result<Vec<u8>, SheetDatasetError> {
    let mut writer = XmlWriter::new()?;
    writer.start("worksheet", &[("xmlns", excel::NS_SPREADSHEET)])?;
    if let Some((rows, cols)) = sheet.dimensions() {
        let dimension = format!("A1:{}", index_to_reference(rows - 1, cols - 1));
        writer.empty("dimension", &[("ref", dimension.as_str())])?;
    }
    writer.start("sheetData", &[])?;
    let mut current_row = None::<usize>;
    for cell in sheet.cells().filter(|cell| !cell.is_empty()) {
        if current_row != Some(cell.row) {
            if current_row.is_some() {
                writer.end("row")?;
            }
            let number = (cell.row + 1).to_string();
            writer.start("row", &[("r", number.as_str())])?;
            current_row = Some(cell.row);
        }
        write_cell(&mut writer, cell)?;
    }
    if current_row.is_some() {
        writer.end("row")?;
    }
    writer.end("sheetData")?;
    writer.end("worksheet")?;
    Ok(writer.into_inner())
}

fn write_cell(writer: &mut XmlWriter, cell: &Cell) -> Result<(), SheetDatasetError> {
    let reference = cell.reference();
    let style = cell.style.map(|style| style.to_string());
    let mut attributes = vec![("r", reference.as_str())];
    if let Some(style) = &style {
        attributes.push(("s", style.as_str()));
    }
    let kind = match cell.kind {
        CellType::InlineString => Some("inlineStr"),
        CellType::Boolean => Some("b"),
        CellType::IsoDateTime => Some("d"),
        CellType::Error => Some("e"),
        _ => None,
    };
    if let Some(kind) = kind {
        attributes.push(("t", kind));
    }

    writer.start("c", &attributes)?;
    if cell.kind == CellType::InlineString {
        let space: &[(&str, &str)] = if cell.value.trim() != cell.value {
            &[("xml:space", "preserve")]
        } else {
            &[]
        };
        writer.start("is", &[])?;
        writer.text_element("t", space, &cell.value)?;
        writer.end("is")?;
    } else {
        writer.text_element("v", &[], &cell.value)?;
    }
    writer.end("c")
}
