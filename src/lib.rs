//! # Rusty Roster
//!
//! Reads a teacher's grade spreadsheet and turns every student row into a normalized
//! [`StudentRecord`]. Gradebooks have no fixed schema, so the layout is inferred from
//! the header labels:
//!
//! - the header row is the first of the leading rows that mentions a name or student;
//! - criterion columns `A`-`D` are recognized and paired with the comment column next to them;
//! - generic score columns (`Total`, `Mark`, `Q1`, ...) join the average when they hold 1-10;
//! - six well-known text fields (behaviour, attitude, progress, ...) are lifted out;
//! - everything else is kept as context text, except numbers that look like ids or raw totals.
//!
//! Excel 2007+ (`.xlsx`, `.xlsm`) and OpenDocument (`.ods`) workbooks are supported; only
//! the first sheet is read. Decoding can fail with a [`DecodeError`], extraction never does.
//!
//! ```no_run
//! # async fn demo() -> Result<(), rusty_roster::DecodeError> {
//! let records = rusty_roster::parse_file("marks.xlsx").await?;
//! for record in &records {
//!     println!("{}: {}", record.name, record.score);
//! }
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod extract;
mod helpers;
pub mod spreadsheet;

pub use crate::error::DecodeError;
pub use crate::error::RustyRosterError;
pub use crate::extract::extract_records;
pub use crate::extract::header::locate_header_row;
pub use crate::extract::header::select_name_column;
pub use crate::extract::record::CriterionScore;
pub use crate::extract::record::RecordStatus;
pub use crate::extract::record::StudentRecord;
pub use crate::extract::row::extract_row;
pub use crate::extract::rules::classify_column;
pub use crate::extract::rules::ColumnRole;
pub use crate::extract::score::ScoreAggregator;
pub use crate::extract::ExtractOptions;
pub use crate::spreadsheet::cell::CellValue;

use std::path::Path;
use tracing::info;

/// Decodes workbook bytes and extracts the records of its first sheet.
///
/// `name` is only used in messages and logs; the format is detected from the bytes.
pub fn parse_bytes(name: &str, bytes: Vec<u8>, options: &ExtractOptions) -> Result<Vec<StudentRecord>, DecodeError> {
    let grid = spreadsheet::read_grid(name, bytes)?;
    let records = extract_records(&grid, options);
    info!(name, records = records.len(), "parsed spreadsheet");
    Ok(records)
}

/// Parses workbook bytes on the blocking pool with the default options.
///
/// Resolves once with every record, or with the error that stopped decoding.
pub async fn parse(name: &str, bytes: Vec<u8>) -> Result<Vec<StudentRecord>, DecodeError> {
    let name = name.to_owned();
    tokio::task::spawn_blocking(move || parse_bytes(&name, bytes, &ExtractOptions::default())).await?
}

/// Reads a workbook from disk and parses it.
pub async fn parse_file(path: impl AsRef<Path>) -> Result<Vec<StudentRecord>, DecodeError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse(&name, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::fixtures::ods_bytes;
    use crate::spreadsheet::fixtures::xlsx_bytes;

    fn marks_xlsx() -> Vec<u8> {
        xlsx_bytes(
            "<si><t>Student Name</t></si>\
             <si><t>A</t></si>\
             <si><t>A Comment</t></si>\
             <si><t>Learning Attitude</t></si>\
             <si><t>Ann Lee</t></si>\
             <si><t>Great job</t></si>\
             <si><t>Curious</t></si>\
             <si><t>Bob Roe</t></si>",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c><c r="D1" t="s"><v>3</v></c></row>
               <row r="2"><c r="A2" t="s"><v>4</v></c><c r="B2"><v>7</v></c><c r="C2" t="s"><v>5</v></c><c r="D2" t="s"><v>6</v></c></row>
               <row r="4"><c r="A4" t="s"><v>7</v></c><c r="B4"><v>9.5</v></c></row>"#,
        )
    }

    #[tokio::test]
    async fn parses_xlsx_end_to_end() {
        let records = parse("marks.xlsx", marks_xlsx()).await.unwrap();
        assert_eq!(records.len(), 2);

        let ann = &records[0];
        assert_eq!(ann.name, "Ann Lee");
        assert_eq!(ann.score, 7);
        assert_eq!(ann.criteria_scores[&'A'], CriterionScore { score: 7.0, comment: "Great job".to_owned() });
        assert_eq!(ann.learning_attitude, "Curious");
        assert_eq!(ann.original_comments, "Criterion A: 7 - Great job\n\nLearning Attitude: Curious");
        assert_eq!(ann.status, RecordStatus::Idle);

        let bob = &records[1];
        assert_eq!(bob.name, "Bob Roe");
        assert_eq!(bob.score, 10);
        assert_eq!(bob.original_comments, "Criterion A: 9.5");
    }

    #[tokio::test]
    async fn parsing_twice_gives_equivalent_records() {
        let first = parse("marks.xlsx", marks_xlsx()).await.unwrap();
        let second = parse("marks.xlsx", marks_xlsx()).await.unwrap();
        assert_eq!(first.len(), second.len());
        for (left, right) in first.iter().zip(&second) {
            assert!(left.equivalent(right));
            assert_ne!(left.id, right.id);
        }
    }

    #[tokio::test]
    async fn garbage_is_a_decode_error() {
        let error = parse("marks.xlsx", b"definitely not a workbook".to_vec()).await.unwrap_err();
        assert!(error.to_string().starts_with("Open 'marks.xlsx' failed"));
    }

    #[tokio::test]
    async fn missing_file_is_a_decode_error() {
        let error = parse_file("/nonexistent/marks.xlsx").await.unwrap_err();
        assert!(matches!(error, RustyRosterError::IoError(_)));
    }

    #[tokio::test]
    async fn parses_ods() {
        let bytes = ods_bytes(
            r#"<table:table table:name="Marks">
                 <table:table-row>
                   <table:table-cell office:value-type="string"><text:p>Name</text:p></table:table-cell>
                   <table:table-cell office:value-type="string"><text:p>Total</text:p></table:table-cell>
                   <table:table-cell office:value-type="string"><text:p>Progress</text:p></table:table-cell>
                 </table:table-row>
                 <table:table-row>
                   <table:table-cell office:value-type="string"><text:p>Cy Doe</text:p></table:table-cell>
                   <table:table-cell office:value-type="float" office:value="6"><text:p>6</text:p></table:table-cell>
                   <table:table-cell office:value-type="string"><text:p>Rapid</text:p></table:table-cell>
                 </table:table-row>
               </table:table>"#,
        );
        let records = parse("marks.ods", bytes).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Cy Doe");
        assert_eq!(records[0].score, 6);
        assert_eq!(records[0].progress, "Rapid");
        assert_eq!(records[0].original_comments, "Total: 6\n\nProgress: Rapid");
    }

    #[test]
    fn parse_bytes_honours_options() {
        let options = ExtractOptions { parallel: true, ..Default::default() };
        let records = parse_bytes("marks.xlsx", marks_xlsx(), &options).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Ann Lee");
    }

    #[test]
    fn out_of_range_reference_is_a_decode_error() {
        let bytes = xlsx_bytes("", r#"<row><c r="A18446744073709551615" t="inlineStr"><is><t>Name</t></is></c></row>"#);
        let error = parse_bytes("huge.xlsx", bytes, &ExtractOptions::default()).unwrap_err();
        assert!(error.to_string().contains("outside the 1048576 x 16384 sheet limits"));
    }

    #[test]
    fn empty_sheet_has_no_records() {
        let records = parse_bytes("blank.xlsx", xlsx_bytes("", ""), &ExtractOptions::default()).unwrap();
        assert!(records.is_empty());
    }
}
