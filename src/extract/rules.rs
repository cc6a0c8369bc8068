//! Column role classification.
//!
//! Roles are decided by an ordered table of label rules, evaluated top to bottom with the
//! first match winning. The order is load-bearing: "Classroom Behaviour Score" is a fixed
//! field, not a generic score, because the field rules come first. All patterns run
//! against the lower-cased header label.
//!
//! | # | Role                  | Label rule                                                  |
//! |---|-----------------------|-------------------------------------------------------------|
//! | 1 | ClassroomBehaviour    | "classroom" and "behaviour"/"behavior", either order        |
//! | 2 | LearningAttitude      | "learning" and "attitude", either order                     |
//! | 3 | SubmissionQuality     | "submission" and "quality", either order                    |
//! | 4 | SubmissionPunctuality | "submission" and "punctuality", either order                |
//! | 5 | Progress              | trimmed label is exactly "progress"                         |
//! | 6 | PersonalNote          | "personal" and "note", either order                         |
//! | 7 | Criterion(letter)     | trimmed label is `[criterion] A-D [score]`                  |
//! | 8 | GenericScore          | no "comment", and a score keyword or a 1-3 char alnum label |
//! | 9 | FreeText              | anything else with a non-numeric cell                       |

use crate::spreadsheet::cell::CellValue;
use regex::Regex;
use std::sync::LazyLock;

/// Generic score values outside this range are dropped.
pub(crate) const GENERIC_SCORE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

/// The six free-text fields a record carries besides its scores.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixedField {
    ClassroomBehaviour,
    LearningAttitude,
    SubmissionQuality,
    SubmissionPunctuality,
    Progress,
    PersonalNote,
}

impl FixedField {
    /// Label used for the field's context line.
    pub const fn canonical_label(&self) -> &'static str {
        match self {
            Self::ClassroomBehaviour => "Classroom Behaviour",
            Self::LearningAttitude => "Learning Attitude",
            Self::SubmissionQuality => "Submission Quality",
            Self::SubmissionPunctuality => "Submission Punctuality",
            Self::Progress => "Progress",
            Self::PersonalNote => "Personal Note",
        }
    }
}

/// Semantic role of one column within one row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColumnRole {
    Name,
    ClassroomBehaviour,
    LearningAttitude,
    SubmissionQuality,
    SubmissionPunctuality,
    Progress,
    PersonalNote,
    /// Rubric criterion A-D, always upper case
    Criterion(char),
    /// Comment cell claimed by the criterion column to its left
    CriterionComment,
    GenericScore,
    FreeText,
    Ignored,
}

impl ColumnRole {
    pub fn fixed_field(&self) -> Option<FixedField> {
        match self {
            Self::ClassroomBehaviour => Some(FixedField::ClassroomBehaviour),
            Self::LearningAttitude => Some(FixedField::LearningAttitude),
            Self::SubmissionQuality => Some(FixedField::SubmissionQuality),
            Self::SubmissionPunctuality => Some(FixedField::SubmissionPunctuality),
            Self::Progress => Some(FixedField::Progress),
            Self::PersonalNote => Some(FixedField::PersonalNote),
            _ => None,
        }
    }
}

impl From<FixedField> for ColumnRole {
    fn from(field: FixedField) -> Self {
        match field {
            FixedField::ClassroomBehaviour => Self::ClassroomBehaviour,
            FixedField::LearningAttitude => Self::LearningAttitude,
            FixedField::SubmissionQuality => Self::SubmissionQuality,
            FixedField::SubmissionPunctuality => Self::SubmissionPunctuality,
            FixedField::Progress => Self::Progress,
            FixedField::PersonalNote => Self::PersonalNote,
        }
    }
}

/// What a label rule yields before the cell value is looked at.
#[derive(Copy, Clone, Debug, PartialEq)]
enum LabelMatch {
    Field(FixedField),
    Criterion(char),
    GenericScore,
}

enum Predicate {
    /// Pattern searched anywhere in the label
    Contains(Regex),
    /// Pattern matched against the trimmed label; group 1 captures the criterion letter
    Criterion(Regex),
    /// Keyword or short label, provided the label never mentions a comment
    GenericScore { keywords: Regex, short: Regex },
}

struct Rule {
    field: Option<FixedField>,
    predicate: Predicate,
}

impl Rule {
    fn field(field: FixedField, pattern: &str) -> Self {
        Self {
            field: Some(field),
            predicate: Predicate::Contains(Regex::new(pattern).expect("Hardcode regex pattern")),
        }
    }

    fn apply(&self, label: &str) -> Option<LabelMatch> {
        match &self.predicate {
            Predicate::Contains(pattern) => {
                if pattern.is_match(label) {
                    self.field.map(LabelMatch::Field)
                } else {
                    None
                }
            }
            Predicate::Criterion(pattern) => pattern
                .captures(label.trim())
                .and_then(|captures| captures.get(1))
                .and_then(|letter| letter.as_str().chars().next())
                .map(|letter| LabelMatch::Criterion(letter.to_ascii_uppercase())),
            Predicate::GenericScore { keywords, short } => {
                let is_score = !label.contains("comment")
                    && (keywords.is_match(label) || short.is_match(label.trim()));
                is_score.then_some(LabelMatch::GenericScore)
            }
        }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::field(FixedField::ClassroomBehaviour, r"(?s)classroom.*behaviou?r|behaviou?r.*classroom"),
        Rule::field(FixedField::LearningAttitude, r"(?s)learning.*attitude|attitude.*learning"),
        Rule::field(FixedField::SubmissionQuality, r"(?s)submission.*quality|quality.*submission"),
        Rule::field(FixedField::SubmissionPunctuality, r"(?s)submission.*punctuality|punctuality.*submission"),
        Rule::field(FixedField::Progress, r"^\s*progress\s*$"),
        Rule::field(FixedField::PersonalNote, r"(?s)personal.*note|note.*personal"),
        Rule {
            field: None,
            predicate: Predicate::Criterion(
                Regex::new(r"^(?:criterion\s*)?([a-d])(?:\s*score)?$").expect("Hardcode regex pattern"),
            ),
        },
        Rule {
            field: None,
            predicate: Predicate::GenericScore {
                keywords: Regex::new(r"score|grade|mark|criterion|crit|total|sum").expect("Hardcode regex pattern"),
                short: Regex::new(r"^[a-z0-9]{1,3}$").expect("Hardcode regex pattern"),
            },
        },
    ]
});

/// Matches a lower-cased label against the rules in priority order.
/// `skip_criterion` resumes after the criterion rule, for criterion cells that are not numbers.
fn match_label(label: &str, skip_criterion: bool) -> Option<LabelMatch> {
    RULES
        .iter()
        .filter(|rule| !(skip_criterion && matches!(rule.predicate, Predicate::Criterion(_))))
        .find_map(|rule| rule.apply(label))
}

/// Classifies one column of one row from its header label and cell value.
///
/// Row state (the name column, comment columns already consumed) is not known here; the
/// row extractor applies it before calling this.
pub fn classify_column(label: &str, cell: &CellValue) -> ColumnRole {
    if cell.is_blank() {
        return ColumnRole::Ignored;
    }
    let label = label.to_lowercase();
    let number = cell.as_number();
    let matched = match match_label(&label, false) {
        Some(LabelMatch::Criterion(_)) if number.is_none() => match_label(&label, true),
        matched => matched,
    };
    match matched {
        Some(LabelMatch::Field(field)) => field.into(),
        Some(LabelMatch::Criterion(letter)) => ColumnRole::Criterion(letter),
        Some(LabelMatch::GenericScore) => match number {
            Some(value) if !cell.is_bool() && GENERIC_SCORE_RANGE.contains(&value) => ColumnRole::GenericScore,
            Some(_) => ColumnRole::Ignored,
            None => ColumnRole::FreeText,
        },
        None if number.is_some() => ColumnRole::Ignored,
        None => ColumnRole::FreeText,
    }
}

/// True if a column labelled `next_label` holds the comment for criterion `letter`.
pub fn is_criterion_comment_label(next_label: &str, letter: char) -> bool {
    let next_label = next_label.to_lowercase();
    next_label.contains("comment") || next_label.contains(letter.to_ascii_lowercase())
}
