use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::SpreadsheetError;

/// Largest sheet a workbook application writes: rows 1-1048576, columns A-XFD.
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLUMNS: usize = 16_384;

/// The first worksheet of a workbook, materialized as a dense grid.
///
/// Rows are ragged: a row only extends to its last non-blank cell, and rows with no
/// cells at all are empty vectors. Gaps before a populated cell are filled with
/// `CellValue::Blank` so column indexes stay aligned with the sheet.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    /// Sheet name as recorded in the workbook
    pub name: String,
    /// Row-major cell values, indexed `[row][col]` from the top-left of the sheet
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stores a cell, growing the grid as needed. Blank values are not stored.
    /// Positions beyond `MAX_ROWS` x `MAX_COLUMNS` are rejected before anything is allocated.
    pub(crate) fn push(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), SpreadsheetError> {
        if row >= MAX_ROWS || col >= MAX_COLUMNS {
            return Err(SpreadsheetError::CellOutOfRangeError { row, col });
        }
        if value == CellValue::Blank {
            return Ok(());
        }
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Blank);
        }
        cells[col] = value;
        Ok(())
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }
}
