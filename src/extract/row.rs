use crate::extract::header::HeaderRow;
use crate::extract::record::CriterionScore;
use crate::extract::record::RecordBuilder;
use crate::extract::record::StudentRecord;
use crate::extract::rules::classify_column;
use crate::extract::rules::is_criterion_comment_label;
use crate::extract::rules::ColumnRole;
use crate::spreadsheet::cell::CellValue;
use std::collections::HashSet;
use tracing::debug;

/// Extracts the record of one data row, or `None` when the row has no usable name.
///
/// Columns are walked left to right. A criterion column may claim the column to its
/// right as its comment; claimed columns are remembered in a set that lives only for
/// this call, and are skipped when the walk reaches them.
pub fn extract_row(row: &[CellValue], header: &HeaderRow, name_col: usize) -> Option<StudentRecord> {
    let name = row.get(name_col).filter(|cell| !cell.is_blank())?.to_string();

    let mut consumed = HashSet::<usize>::new();
    let mut builder = RecordBuilder::new();
    for (col, cell) in row.iter().enumerate() {
        let role = row_role(col, cell, header, name_col, &consumed);
        match role {
            ColumnRole::Criterion(letter) => {
                let Some(score) = cell.as_number() else {
                    continue;
                };
                builder.scores().add_criterion(score);
                let comment = criterion_comment(row, header, col, letter);
                let mut line = format!("Criterion {}: {}", letter, score);
                if let Some(comment) = &comment {
                    line.push_str(" - ");
                    line.push_str(comment);
                    consumed.insert(col + 1);
                    debug!(col = col + 1, criterion = %letter, "comment column paired with criterion");
                }
                builder.set_criterion(letter, CriterionScore {
                    score,
                    comment: comment.unwrap_or_default(),
                });
                builder.push_context(line);
            }
            ColumnRole::GenericScore => {
                if let Some(score) = cell.as_number() {
                    builder.scores().add_generic(score);
                    builder.push_context(format!("{}: {}", header.label(col), score));
                }
            }
            ColumnRole::FreeText => {
                builder.push_context(format!("{}: {}", header.label(col), cell));
            }
            ColumnRole::Name | ColumnRole::CriterionComment | ColumnRole::Ignored => (),
            field_role => {
                if let Some(field) = field_role.fixed_field() {
                    let value = cell.to_string();
                    builder.push_context(format!("{}: {}", field.canonical_label(), value));
                    builder.set_field(field, value);
                }
            }
        }
    }
    Some(builder.build(&name))
}

/// Role of a column within this row, applying the row state before the label rules.
fn row_role(col: usize, cell: &CellValue, header: &HeaderRow, name_col: usize, consumed: &HashSet<usize>) -> ColumnRole {
    if col == name_col {
        ColumnRole::Name
    } else if consumed.contains(&col) {
        ColumnRole::CriterionComment
    } else {
        classify_column(&header.label(col), cell)
    }
}

/// Comment for the criterion in `col`: the next cell, when it is filled in and its label
/// mentions a comment or the criterion letter.
fn criterion_comment(row: &[CellValue], header: &HeaderRow, col: usize, letter: char) -> Option<String> {
    let next = row.get(col + 1).filter(|cell| !cell.is_blank())?;
    if is_criterion_comment_label(&header.label(col + 1), letter) {
        Some(next.to_string())
    } else {
        None
    }
}
