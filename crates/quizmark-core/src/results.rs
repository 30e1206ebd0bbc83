//! Score results produced by the evaluator.

use serde::{Deserialize, Serialize};

use crate::answer_key::AcceptedAnswer;
use crate::answers::Answer;
use crate::band::BandTier;
use crate::model::Skill;

/// Outcome for one keyed question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    /// What the candidate submitted, if anything.
    pub submitted: Option<Answer>,
    pub accepted: AcceptedAnswer,
    pub correct: bool,
}

/// Result of evaluating one attempt. Recomputed on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub skill: Skill,
    /// Outcomes in numeric question order.
    pub per_question: Vec<QuestionOutcome>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub percentage: f64,
    /// `None` for skills scored by an external grader.
    pub band: Option<f64>,
    pub band_tier: Option<BandTier>,
}

impl ScoreResult {
    pub fn incorrect(&self) -> impl Iterator<Item = &QuestionOutcome> {
        self.per_question.iter().filter(|q| !q.correct)
    }

    pub fn unanswered_count(&self) -> usize {
        self.per_question
            .iter()
            .filter(|q| q.submitted.as_ref().map_or(true, Answer::is_blank))
            .count()
    }

    pub fn outcome(&self, question_id: &str) -> Option<&QuestionOutcome> {
        self.per_question
            .iter()
            .find(|q| q.question_id == question_id)
    }

    /// One-line summary such as `31/40 (77.5%) band 7.0`.
    pub fn summary(&self) -> String {
        let band = self
            .band
            .map(|b| format!(" band {b:.1}"))
            .unwrap_or_default();
        format!(
            "{}/{} ({:.1}%){band}",
            self.correct_count, self.total_questions, self.percentage
        )
    }
}
