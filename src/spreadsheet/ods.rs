use crate::error::RustyRosterError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::sheet::MAX_COLUMNS;
use crate::spreadsheet::sheet::MAX_ROWS;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Cursor;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Placeholder cell hidden under a merged range
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// Cell comment, never part of the value
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of `text:c` spaces
const SPACES: QName = QName(b"text:s");
/// Upper bound on the cells one sheet may materialize from repeated value cells
const MAX_REPEATED_CELLS: usize = 1 << 22;

#[derive(Error, Debug)]
pub enum OdsError {
    #[error("Invalid ODS MIME type")]
    MimeTypeError,

    #[error("ODS file '{0}' is password protected")]
    PasswordProtectedError(String),
}

/// An OpenDocument spreadsheet (`.ods`) held in memory.
pub(crate) struct OdsSpreadsheet {
    name: String,
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl OdsSpreadsheet {
    /// Validates the MIME type and encryption manifest of an already opened archive.
    pub(crate) fn open(name: &str, mut zip: ZipArchive<Cursor<Vec<u8>>>) -> Result<Self, RustyRosterError> {
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(OdsError::PasswordProtectedError(name.to_owned()))?;
        }
        Ok(OdsSpreadsheet {
            name: name.to_owned(),
            zip,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn read_first_sheet(&mut self) -> Result<Sheet, RustyRosterError> {
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::MissingPartError("content.xml".to_owned()))?;

        let mut sheet = None::<Sheet>;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                let table_name = event.get_attribute_value("table:name")?.unwrap_or_default();
                sheet = Some(Sheet::new(&table_name));
                break;
            }
        });
        let mut sheet = sheet.ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(self.name.to_owned()))?;

        let mut row = 0usize;
        let mut col = 0usize;
        let mut rows_repeated = 1usize;
        let mut cols_repeated = 1usize;
        let mut value = CellValue::Blank;
        let mut text = String::new();
        let mut text_context = false; // reading a string cell's paragraphs
        let mut comment_context = false;
        let mut expanded = 0usize;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                rows_repeated = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row = row.saturating_add(rows_repeated);
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                text.clear();
                text_context = false;
                cols_repeated = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                value = match event.get_attribute_value("office:value-type")?.as_deref() {
                    Some("float") | Some("percentage") | Some("currency") => event
                        .get_attribute_value("office:value")?
                        .and_then(|number| number.trim().parse::<f64>().ok())
                        .map(CellValue::Number)
                        .unwrap_or(CellValue::Blank),
                    Some("boolean") => CellValue::Bool(
                        event.get_attribute_value("office:boolean-value")?
                            .map(|flag| flag != "false" && flag != "0")
                            .unwrap_or(false),
                    ),
                    Some("date") => event
                        .get_attribute_value("office:date-value")?
                        .map(|date| CellValue::Text(date.to_string()))
                        .unwrap_or(CellValue::Blank),
                    Some("time") => event
                        .get_attribute_value("office:time-value")?
                        .map(|time| CellValue::Text(time.to_string()))
                        .unwrap_or(CellValue::Blank),
                    Some(_) => {
                        // error results are flagged by calcext and read as blank
                        let is_error = event.get_attribute_value("calcext:value-type")?
                            .map(|kind| kind == "error")
                            .unwrap_or(false);
                        text_context = !is_error;
                        CellValue::Blank
                    }
                    None => CellValue::Blank,
                };
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if text_context && !text.is_empty() {
                    value = CellValue::Text(std::mem::take(&mut text));
                }
                if value != CellValue::Blank {
                    expanded = expand_repeated(&mut sheet, (row, col), (rows_repeated, cols_repeated), &value, expanded)?;
                }
                col = col.saturating_add(cols_repeated);
                value = CellValue::Blank;
                text_context = false;
                comment_context = false;
            }
            Event::Start(event) if text_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if text_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if text_context && !comment_context && event.name() == PARAGRAPH => {
                if !text.is_empty() {
                    text.push('\n');
                }
            }
            Event::Start(event) if text_context && !comment_context && event.name() == SPACES => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                for _ in 0..count {
                    text.push(' ');
                }
            }
            Event::Text(event) if text_context && !comment_context => text.push_bytes_text(&event)?,
            Event::GeneralRef(event) if text_context && !comment_context => text.push_bytes_ref(&event)?,
        });
        Ok(sheet)
    }
}

/// Writes a value cell over its repeated block and returns the updated count of cells
/// produced by repeats. The block must fit the sheet limits and the running count must
/// stay within `MAX_REPEATED_CELLS`.
fn expand_repeated(
    sheet: &mut Sheet,
    (row, col): (usize, usize),
    (rows_repeated, cols_repeated): (usize, usize),
    value: &CellValue,
    expanded: usize,
) -> Result<usize, SpreadsheetError> {
    if rows_repeated == 0 || cols_repeated == 0 {
        return Ok(expanded);
    }
    let last_row = row.saturating_add(rows_repeated - 1);
    let last_col = col.saturating_add(cols_repeated - 1);
    if last_row >= MAX_ROWS || last_col >= MAX_COLUMNS {
        return Err(SpreadsheetError::CellOutOfRangeError { row: last_row, col: last_col });
    }
    let cells = rows_repeated.saturating_mul(cols_repeated);
    let expanded = if cells > 1 { expanded.saturating_add(cells) } else { expanded };
    if expanded > MAX_REPEATED_CELLS {
        return Err(SpreadsheetError::RepeatLimitError(MAX_REPEATED_CELLS));
    }
    for row_offset in 0..rows_repeated {
        for col_offset in 0..cols_repeated {
            sheet.push(row + row_offset, col + col_offset, value.clone())?;
        }
    }
    Ok(expanded)
}

fn check_mime(zip: &mut ZipArchive<Cursor<Vec<u8>>>) -> Result<(), RustyRosterError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// An encrypted package lists `manifest:encryption-data` under one of its file entries.
fn is_password_protected(zip: &mut ZipArchive<Cursor<Vec<u8>>>) -> Result<bool, RustyRosterError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}
