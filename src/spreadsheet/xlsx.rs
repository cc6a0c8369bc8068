use crate::error::RustyRosterError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::io::BufRead;
use std::io::Cursor;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// How the payload of a `<c>` element is to be read, from its `t` attribute.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum XlsxCellKind {
    #[default]
    Number,
    SharedString,
    InlineString,
    Boolean,
    IsoDateTime,
    Error,
}

impl XlsxCellKind {
    fn parse(kind: Option<&str>) -> Self {
        match kind {
            Some("s") => Self::SharedString,
            Some("inlineStr") | Some("str") => Self::InlineString,
            Some("b") => Self::Boolean,
            Some("d") => Self::IsoDateTime,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }
}

/// An Excel 2007+ workbook (`.xlsx`, `.xlsm`) held in memory.
pub(crate) struct XlsxSpreadsheet {
    name: String,
    zip: ZipArchive<Cursor<Vec<u8>>>,
    /// First worksheet as (sheet name, archive path)
    first_sheet: (String, String),
}

impl XlsxSpreadsheet {
    /// Resolves the first worksheet of an already opened archive.
    pub(crate) fn open(name: &str, mut zip: ZipArchive<Cursor<Vec<u8>>>) -> Result<Self, RustyRosterError> {
        let first_sheet = load_first_sheet(&mut zip)?
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(name.to_owned()))?;
        Ok(XlsxSpreadsheet {
            name: name.to_owned(),
            zip,
            first_sheet,
        })
    }

    /// Loads the whole shared string table; cells refer to it by position.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, RustyRosterError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
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
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_first_sheet(&mut self) -> Result<Sheet, RustyRosterError> {
        let shared_strings = self.load_shared_strings()?;
        let (sheet_name, zip_path) = self.first_sheet.clone();
        let mut sheet = Sheet::new(&sheet_name);
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::MissingPartError(zip_path.to_owned()))?;

        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = XlsxCellKind::default();
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                row_count = event.parse_attribute_value::<usize>("r")?
                    .and_then(|number| number.checked_sub(1))
                    .unwrap_or(row_count);
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count = row_count.saturating_add(1);
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col.saturating_add(1);
                kind = XlsxCellKind::parse(event.get_attribute_value("t")?.as_deref());
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                let cell = to_cell_value(kind, &value, &shared_strings)?;
                sheet.push(row, col, cell)?;
                value.clear();
            }
        });
        Ok(sheet)
    }
}

/// Converts the raw text of a `<c>` element to a cell value.
fn to_cell_value(kind: XlsxCellKind, value: &str, shared_strings: &[String]) -> Result<CellValue, RustyRosterError> {
    if value.is_empty() {
        return Ok(CellValue::Blank);
    }
    let cell = match kind {
        XlsxCellKind::SharedString => {
            let index = value.trim().parse::<usize>()?;
            let text = shared_strings
                .get(index)
                .ok_or(SpreadsheetError::SharedStringIndexError(index))?;
            CellValue::Text(text.to_owned())
        }
        XlsxCellKind::InlineString | XlsxCellKind::IsoDateTime => CellValue::Text(value.to_owned()),
        XlsxCellKind::Boolean => CellValue::Bool(value.trim() == "1" || value.trim() == "true"),
        XlsxCellKind::Error => CellValue::Blank,
        XlsxCellKind::Number => match value.trim().parse::<f64>() {
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(value.to_owned()),
        },
    };
    Ok(cell)
}

/// Finds the first `<sheet>` of `xl/workbook.xml` and its archive path.
fn load_first_sheet(zip: &mut ZipArchive<Cursor<Vec<u8>>>) -> Result<Option<(String, String)>, RustyRosterError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::MissingPartError("xl/workbook.xml".to_owned()))?;
    let mut first_sheet = None::<(String, String)>;
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
                if let Some(path) = relationships.get(id.as_ref()) {
                    first_sheet = Some((name.to_string(), path.to_owned()));
                    break;
                }
            }
        }
    });
    Ok(first_sheet)
}

/// Reads the text of a string element up to `end_tag`, skipping phonetic runs.
/// With `is_text_content` the element's own character data counts (`<v>`); otherwise
/// only `<t>` children do (`<si>`, `<is>`).
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, RustyRosterError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&String::from_utf8_lossy(&event)),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
