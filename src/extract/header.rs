//! Header row location and name column selection.

use crate::spreadsheet::cell::CellValue;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Any text cell containing one of these words marks a header row.
static HEADER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)name|student").expect("Hardcode regex pattern"));

/// "Student Name", "StudentName", "Name", "Full Name" or a bare "Student".
static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:student\s*)?name\b|^\s*student\s*$").expect("Hardcode regex pattern")
});

/// Returns the index of the first row, among the first `search_rows`, holding a text cell
/// that mentions "name" or "student". Falls back to row 0.
pub fn locate_header_row(grid: &[Vec<CellValue>], search_rows: usize) -> usize {
    grid.iter()
        .take(search_rows)
        .position(|row| {
            row.iter()
                .filter_map(CellValue::as_text)
                .any(|text| HEADER_MARKER.is_match(text))
        })
        .unwrap_or(0)
}

/// Column labels of the header row, index-aligned with every data row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderRow {
    labels: Vec<Option<String>>,
}

impl HeaderRow {
    pub fn new(cells: &[CellValue]) -> Self {
        let labels = cells
            .iter()
            .map(|cell| {
                if cell.is_blank() {
                    None
                } else {
                    Some(cell.to_string())
                }
            })
            .collect();
        Self { labels }
    }

    /// Label of column `col`; a missing label reads as "Column <col>".
    pub fn label(&self, col: usize) -> Cow<'_, str> {
        match self.labels.get(col) {
            Some(Some(label)) => Cow::Borrowed(label.as_str()),
            _ => Cow::Owned(format!("Column {}", col)),
        }
    }

    /// Number of cells in the header row, including blank ones.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Picks the leftmost column whose label looks like a student name, or column 0.
pub fn select_name_column(header: &HeaderRow) -> usize {
    (0..header.len())
        .find(|&col| NAME_LABEL.is_match(&header.label(col)))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|cell| if cell.is_empty() { CellValue::Blank } else { CellValue::from(*cell) })
            .collect()
    }

    #[test]
    fn header_defaults_to_first_row() {
        let grid = vec![row(&["Class 7B"]), row(&["Ann", "8"]), row(&["Bob", "6"])];
        assert_eq!(locate_header_row(&grid, 10), 0);
    }

    #[test]
    fn header_first_match_wins() {
        let grid = vec![
            row(&["Term report"]),
            row(&[""]),
            row(&["Student", "A"]),
            row(&["Name", "B"]),
        ];
        assert_eq!(locate_header_row(&grid, 10), 2);
    }

    #[test]
    fn header_is_case_insensitive_substring() {
        let grid = vec![row(&["x"]), row(&["", "SURNAME"])];
        assert_eq!(locate_header_row(&grid, 10), 1);
    }

    #[test]
    fn header_search_window_is_bounded() {
        let mut grid = vec![row(&["filler"]); 10];
        grid.push(row(&["Name"]));
        assert_eq!(locate_header_row(&grid, 10), 0);
        assert_eq!(locate_header_row(&grid, 11), 10);
    }

    #[test]
    fn header_ignores_numbers() {
        let grid = vec![vec![CellValue::from(1)], row(&["Student Name"])];
        assert_eq!(locate_header_row(&grid, 10), 1);
    }

    #[test]
    fn header_of_empty_grid() {
        assert_eq!(locate_header_row(&[], 10), 0);
    }

    #[test]
    fn missing_labels_are_synthetic() {
        let header = HeaderRow::new(&row(&["Name", "", "A"]));
        assert_eq!(header.label(0), "Name");
        assert_eq!(header.label(1), "Column 1");
        assert_eq!(header.label(2), "A");
        assert_eq!(header.label(7), "Column 7");
        assert_eq!(header.len(), 3);
    }

    #[test]
    fn name_column_exact_label_anywhere() {
        let header = HeaderRow::new(&row(&["ID", "Class", "Name", "A"]));
        assert_eq!(select_name_column(&header), 2);
    }

    #[test]
    fn name_column_variants() {
        for label in ["Student Name", "studentname", "STUDENT", "Full Name", "name"] {
            let header = HeaderRow::new(&row(&["ID", label]));
            assert_eq!(select_name_column(&header), 1, "{}", label);
        }
    }

    #[test]
    fn name_column_leftmost_wins() {
        let header = HeaderRow::new(&row(&["Score", "Student", "Name"]));
        assert_eq!(select_name_column(&header), 1);
    }

    #[test]
    fn name_column_defaults_to_zero() {
        let header = HeaderRow::new(&row(&["Pupil", "Surname", "Student ID"]));
        assert_eq!(select_name_column(&header), 0);
    }
}
