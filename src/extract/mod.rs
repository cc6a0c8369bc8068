//! # Record Extraction Module
//!
//! Turns a schema-less grid of cells into student records. The header row and the
//! name column are located first; every later row is then extracted on its own,
//! classifying each column from its header label and pairing criterion scores with
//! the comment column next to them.
//!
//! Extraction is best effort: rows without a name are skipped and cells that fit no
//! rule are either kept as free text or dropped. It never fails.
pub mod header;
pub mod record;
pub mod row;
pub mod rules;
pub mod score;

use crate::extract::header::locate_header_row;
use crate::extract::header::select_name_column;
use crate::extract::header::HeaderRow;
use crate::extract::record::StudentRecord;
use crate::extract::row::extract_row;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::index_to_col;
use rayon::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Tuning knobs for extraction. The defaults are the documented heuristics.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// How many leading rows may hold the header row.
    pub header_search_rows: usize,

    /// Extract data rows on the rayon pool. Output keeps the sheet's row order.
    pub parallel: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            header_search_rows: 10,
            parallel: false,
        }
    }
}

/// Extracts one record per named data row, in row order.
pub fn extract_records(grid: &[Vec<CellValue>], options: &ExtractOptions) -> Vec<StudentRecord> {
    if grid.is_empty() {
        warn!("sheet has no rows");
        return Vec::new();
    }

    let header_index = locate_header_row(grid, options.header_search_rows);
    let header = HeaderRow::new(&grid[header_index]);
    let name_col = select_name_column(&header);
    debug!(
        header_row = header_index + 1,
        name_column = %index_to_col(name_col),
        name_label = %header.label(name_col),
        "located header"
    );

    let rows = &grid[header_index + 1..];
    let extracted: Vec<Option<StudentRecord>> = if options.parallel {
        rows.par_iter()
            .map(|row| extract_row(row, &header, name_col))
            .collect()
    } else {
        rows.iter()
            .map(|row| extract_row(row, &header, name_col))
            .collect()
    };
    // skipped rows are logged on the calling thread in both modes
    let records: Vec<StudentRecord> = extracted
        .into_iter()
        .enumerate()
        .filter_map(|(offset, record)| {
            if record.is_none() {
                debug!(row = header_index + offset + 2, "skipped row without a name");
            }
            record
        })
        .collect();
    info!(rows = rows.len(), records = records.len(), "extracted student records");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::Mutex;
    use tracing::Level;

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    CellValue::Blank
                } else if let Ok(number) = cell.parse::<f64>() {
                    CellValue::Number(number)
                } else {
                    CellValue::from(*cell)
                }
            })
            .collect()
    }

    fn grid() -> Vec<Vec<CellValue>> {
        vec![
            row(&["Year 8 Science", "", ""]),
            row(&[]),
            row(&["Class", "Student Name", "A", "A Comment", "B", "Progress"]),
            row(&["", "Ann Lee", "7", "Great job", "8", "Steady"]),
            row(&["", "", "9"]),
            row(&[]),
            row(&["", "Bob Roe", "5", "", "15"]),
            row(&["", "Cy Doe", "absent"]),
        ]
    }

    #[test]
    fn empty_grid() {
        assert!(extract_records(&[], &ExtractOptions::default()).is_empty());
    }

    #[test]
    fn records_follow_row_order() {
        let records = extract_records(&grid(), &ExtractOptions::default());
        let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["Ann Lee", "Bob Roe", "Cy Doe"]);

        let ann = &records[0];
        assert_eq!(ann.score, 8);
        assert_eq!(ann.criteria_scores[&'A'].comment, "Great job");
        assert_eq!(ann.progress, "Steady");
        assert_eq!(ann.original_comments, "Criterion A: 7 - Great job\n\nCriterion B: 8\n\nProgress: Steady");

        let bob = &records[1];
        assert_eq!(bob.score, 5);
        assert_eq!(bob.criteria_scores.len(), 2);

        let cy = &records[2];
        assert_eq!(cy.score, 0);
        assert!(cy.criteria_scores.is_empty());
        assert_eq!(cy.original_comments, "A: absent");
    }

    #[test]
    fn header_defaults_to_first_row() {
        let grid = vec![row(&["Pupil", "A"]), row(&["Ann", "6"]), row(&["Bob", "9"])];
        let records = extract_records(&grid, &ExtractOptions::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Bob");
        assert_eq!(records[1].score, 9);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut grid = vec![row(&["Name", "A", "B", "Notes"])];
        for index in 0..200 {
            let name = format!("Student {}", index);
            let a = (index % 10 + 1).to_string();
            grid.push(row(&[name.as_str(), a.as_str(), "7", "ok"]));
            if index % 7 == 0 {
                grid.push(row(&["", "3"]));
            }
        }
        let sequential = extract_records(&grid, &ExtractOptions::default());
        let parallel = extract_records(&grid, &ExtractOptions { parallel: true, ..Default::default() });

        assert_eq!(sequential.len(), 200);
        assert_eq!(sequential.len(), parallel.len());
        for (left, right) in sequential.iter().zip(&parallel) {
            assert!(left.equivalent(right));
            assert_ne!(left.id, right.id);
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn skipped_rows_logged(options: &ExtractOptions) -> usize {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let records = tracing::subscriber::with_default(subscriber, || extract_records(&grid(), options));
        assert_eq!(records.len(), 3);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        logs.matches("skipped row without a name").count()
    }

    #[test]
    fn skipped_rows_are_logged_in_both_modes() {
        assert_eq!(skipped_rows_logged(&ExtractOptions::default()), 2);
        assert_eq!(skipped_rows_logged(&ExtractOptions { parallel: true, ..Default::default() }), 2);
    }

    #[test]
    fn header_search_rows_is_configurable() {
        let grid = vec![row(&["x"]), row(&["x"]), row(&["Name", "A"]), row(&["Ann", "4"])];
        let narrow = ExtractOptions { header_search_rows: 2, ..Default::default() };
        // row 0 becomes the header, so the "Name" row is read as a student called "Name"
        let records = extract_records(&grid, &narrow);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].name, "Name");
    }
}
