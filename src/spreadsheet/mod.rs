//! # Spreadsheet Reading Module
//!
//! Decodes workbook bytes into the grid of raw cell values that the extraction
//! pipeline consumes. Excel 2007+ (`.xlsx`, `.xlsm`) and OpenDocument (`.ods`)
//! packages are supported; only the first sheet is read and cells are taken as
//! plain values without formatting, formula or merge semantics.
pub mod cell;
pub(crate) mod excel;
pub mod ods;
pub(crate) mod reference;
pub mod sheet;
pub(crate) mod xlsx;

use crate::error::RustyRosterError;
use crate::error::ResultMessage;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// Signature of an OLE compound file: legacy `.xls` or an encrypted OOXML package.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Spreadsheet '{0}' is empty")]
    FileEmptyError(String),

    #[error("Spreadsheet '{0}' is a compound document (legacy .xls or password protected), which is not supported")]
    CompoundDocumentError(String),

    #[error("Cannot detect spreadsheet format of '{0}'")]
    UnknownFormatError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Missing workbook part '{0}'")]
    MissingPartError(String),

    #[error("Shared string index {0} is out of range")]
    SharedStringIndexError(usize),

    #[error("Cell at row {row}, column {col} (0-based) lies outside the 1048576 x 16384 sheet limits")]
    CellOutOfRangeError { row: usize, col: usize },

    #[error("Repeated cell would expand to more than {0} cells")]
    RepeatLimitError(usize),
}

/// A decoded workbook that can produce the grid of its first sheet.
pub trait Spreadsheet: Send {
    /// Name the workbook was opened under (usually the file name)
    fn name(&self) -> String;

    /// Reads the first sheet completely; a failure leaves no partial grid.
    fn read_first_sheet(&mut self) -> Result<Sheet, RustyRosterError>;
}

/// Opens workbook bytes, detecting the format from the package contents rather than
/// from the file name, which is only used in messages.
pub fn open_spreadsheet(name: &str, bytes: Vec<u8>) -> Result<Box<dyn Spreadsheet>, RustyRosterError> {
    if bytes.is_empty() {
        Err(SpreadsheetError::FileEmptyError(name.to_owned()))?;
    }
    if bytes.starts_with(&CFB_SIGNATURE) {
        Err(SpreadsheetError::CompoundDocumentError(name.to_owned()))?;
    }

    let zip = ZipArchive::new(Cursor::new(bytes))
        .map_err(RustyRosterError::from)
        .with_prefix(&format!("Open '{}' failed", name))?;
    if zip.contains("mimetype") {
        debug!(name, "detected OpenDocument spreadsheet");
        Ok(Box::new(OdsSpreadsheet::open(name, zip)?))
    } else if zip.contains("xl/workbook.xml") {
        debug!(name, "detected Office Open XML workbook");
        Ok(Box::new(XlsxSpreadsheet::open(name, zip)?))
    } else {
        Err(SpreadsheetError::UnknownFormatError(name.to_owned()))?
    }
}

/// Decodes workbook bytes and returns the rows of the first sheet.
pub fn read_grid(name: &str, bytes: Vec<u8>) -> Result<Vec<Vec<cell::CellValue>>, RustyRosterError> {
    let mut spreadsheet = open_spreadsheet(name, bytes)?;
    let sheet = spreadsheet.read_first_sheet()?;
    debug!(name = %spreadsheet.name(), sheet = %sheet.name, rows = sheet.rows.len(), "read first sheet");
    Ok(sheet.into_rows())
}
