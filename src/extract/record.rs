use crate::extract::rules::FixedField;
use crate::extract::score::ScoreAggregator;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Separator between context lines in `original_comments`.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Processing state of a record. Extraction only ever produces `Idle`; later stages
/// move it along while generating a summary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Idle,
    Generating,
    Completed,
    Failed,
}

/// Score of one rubric criterion with the comment paired to it, if any.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: f64,
    pub comment: String,
}

/// One student's row, normalized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Fresh v4 identifier, unique per record and per parse
    pub id: Uuid,
    pub name: String,
    /// Rounded average of the in-range scores of the row, 0 to 10
    pub score: u8,
    /// Criterion letter (A-D) to score and comment
    pub criteria_scores: BTreeMap<char, CriterionScore>,
    pub classroom_behaviour: String,
    pub learning_attitude: String,
    pub submission_quality: String,
    pub submission_punctuality: String,
    pub progress: String,
    pub personal_note: String,
    /// Every context line of the row, separated by a blank line
    pub original_comments: String,
    /// Filled in by whatever summarizes the record downstream
    pub generated_summary: String,
    pub status: RecordStatus,
}

impl StudentRecord {
    /// Field-wise equality ignoring `id`.
    pub fn equivalent(&self, other: &StudentRecord) -> bool {
        StudentRecord { id: other.id, ..self.clone() } == *other
    }

    /// Value of one of the fixed text fields.
    pub fn field(&self, field: FixedField) -> &str {
        match field {
            FixedField::ClassroomBehaviour => &self.classroom_behaviour,
            FixedField::LearningAttitude => &self.learning_attitude,
            FixedField::SubmissionQuality => &self.submission_quality,
            FixedField::SubmissionPunctuality => &self.submission_punctuality,
            FixedField::Progress => &self.progress,
            FixedField::PersonalNote => &self.personal_note,
        }
    }

    /// Context lines in column order.
    pub fn context_lines(&self) -> impl Iterator<Item = &str> {
        self.original_comments
            .split(CONTEXT_SEPARATOR)
            .filter(|line| !line.is_empty())
    }
}

/// Accumulates what one row yields and assembles the final record.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    fields: BTreeMap<FixedField, String>,
    criteria_scores: BTreeMap<char, CriterionScore>,
    scores: ScoreAggregator,
    context_lines: Vec<String>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed field unless an earlier column already did. Returns whether it was set.
    pub fn set_field(&mut self, field: FixedField, value: String) -> bool {
        if self.fields.contains_key(&field) {
            false
        } else {
            self.fields.insert(field, value);
            true
        }
    }

    /// Records a criterion; a repeated letter replaces the earlier entry.
    pub fn set_criterion(&mut self, letter: char, score: CriterionScore) {
        self.criteria_scores.insert(letter, score);
    }

    pub fn scores(&mut self) -> &mut ScoreAggregator {
        &mut self.scores
    }

    pub fn push_context(&mut self, line: String) {
        self.context_lines.push(line);
    }

    pub fn build(mut self, name: &str) -> StudentRecord {
        let mut take = |field: FixedField| self.fields.remove(&field).unwrap_or_default();
        StudentRecord {
            id: Uuid::new_v4(),
            name: name.trim().to_owned(),
            score: self.scores.average(),
            classroom_behaviour: take(FixedField::ClassroomBehaviour),
            learning_attitude: take(FixedField::LearningAttitude),
            submission_quality: take(FixedField::SubmissionQuality),
            submission_punctuality: take(FixedField::SubmissionPunctuality),
            progress: take(FixedField::Progress),
            personal_note: take(FixedField::PersonalNote),
            criteria_scores: self.criteria_scores,
            original_comments: self.context_lines.join(CONTEXT_SEPARATOR),
            generated_summary: String::new(),
            status: RecordStatus::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder() {
        let record = RecordBuilder::new().build("  Ann Lee ");
        assert_eq!(record.name, "Ann Lee");
        assert_eq!(record.score, 0);
        assert!(record.criteria_scores.is_empty());
        assert_eq!(record.progress, "");
        assert_eq!(record.original_comments, "");
        assert_eq!(record.generated_summary, "");
        assert_eq!(record.status, RecordStatus::Idle);
    }

    #[test]
    fn first_field_value_wins() {
        let mut builder = RecordBuilder::new();
        assert!(builder.set_field(FixedField::Progress, "Steady".to_owned()));
        assert!(!builder.set_field(FixedField::Progress, "Rapid".to_owned()));
        let record = builder.build("Ann");
        assert_eq!(record.field(FixedField::Progress), "Steady");
    }

    #[test]
    fn context_lines_joined_with_blank_line() {
        let mut builder = RecordBuilder::new();
        builder.push_context("Progress: Steady".to_owned());
        builder.push_context("Criterion A: 8".to_owned());
        let record = builder.build("Ann");
        assert_eq!(record.original_comments, "Progress: Steady\n\nCriterion A: 8");
        assert_eq!(record.context_lines().collect::<Vec<_>>(), vec!["Progress: Steady", "Criterion A: 8"]);
    }

    #[test]
    fn ids_are_fresh() {
        let first = RecordBuilder::new().build("Ann");
        let second = RecordBuilder::new().build("Ann");
        assert_ne!(first.id, second.id);
        assert!(first.equivalent(&second));
    }

    #[test]
    fn equivalence_checks_other_fields() {
        let first = RecordBuilder::new().build("Ann");
        let mut second = first.clone();
        second.personal_note = "Shy".to_owned();
        assert!(!first.equivalent(&second));
    }

    #[test]
    fn serializes_camel_case() {
        let mut builder = RecordBuilder::new();
        builder.set_criterion('A', CriterionScore { score: 7.0, comment: "Great job".to_owned() });
        builder.scores().add_criterion(7.0);
        let record = builder.build("Ann");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["score"], 7);
        assert_eq!(json["criteriaScores"]["A"]["score"], 7.0);
        assert_eq!(json["criteriaScores"]["A"]["comment"], "Great job");
        assert_eq!(json["classroomBehaviour"], "");
        assert_eq!(json["generatedSummary"], "");
        assert_eq!(json["status"], "idle");
        assert_eq!(json["id"], record.id.to_string());
    }
}
