//! Score report types with JSON persistence and attempt comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::FinishReason;
use crate::identity::compare_ids;
use crate::model::{Skill, TestDefinition};
use crate::results::ScoreResult;

/// A scored attempt, ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the test taken.
    pub test: TestSummary,
    pub finish_reason: FinishReason,
    pub result: ScoreResult,
}

/// Summary of a test (without its content).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub title: String,
    pub skill: Skill,
    pub question_count: usize,
}

impl From<&TestDefinition> for TestSummary {
    fn from(test: &TestDefinition) -> Self {
        Self {
            id: test.id.clone(),
            title: test.title.clone(),
            skill: test.skill,
            question_count: test.answer_key.len(),
        }
    }
}

impl ScoreReport {
    pub fn new(test: &TestDefinition, finish_reason: FinishReason, result: ScoreResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            test: test.into(),
            finish_reason,
            result,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScoreReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Default file name: `<test id>-<report id>.json`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.test.id, self.id)
    }

    /// Compare this attempt against an earlier one.
    pub fn compare(&self, baseline: &ScoreReport) -> AttemptComparison {
        use std::collections::HashMap;

        let baseline_outcomes: HashMap<&str, bool> = baseline
            .result
            .per_question
            .iter()
            .map(|q| (q.question_id.as_str(), q.correct))
            .collect();

        let mut newly_correct = Vec::new();
        let mut newly_incorrect = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;

        for outcome in &self.result.per_question {
            match baseline_outcomes.get(outcome.question_id.as_str()) {
                Some(&before) if before == outcome.correct => unchanged += 1,
                Some(_) if outcome.correct => newly_correct.push(outcome.question_id.clone()),
                Some(_) => newly_incorrect.push(outcome.question_id.clone()),
                None => new_questions += 1,
            }
        }
        newly_correct.sort_by(|a, b| compare_ids(a, b));
        newly_incorrect.sort_by(|a, b| compare_ids(a, b));

        let band_delta = match (baseline.result.band, self.result.band) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        };

        AttemptComparison {
            baseline_id: baseline.id,
            current_id: self.id,
            baseline_correct: baseline.result.correct_count,
            current_correct: self.result.correct_count,
            newly_correct,
            newly_incorrect,
            unchanged,
            new_questions,
            band_delta,
        }
    }
}

/// Result of comparing two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptComparison {
    pub baseline_id: Uuid,
    pub current_id: Uuid,
    pub baseline_correct: usize,
    pub current_correct: usize,
    /// Questions wrong in the baseline and right now.
    pub newly_correct: Vec<String>,
    /// Questions right in the baseline and wrong now.
    pub newly_incorrect: Vec<String>,
    pub unchanged: usize,
    /// Questions scored now but absent from the baseline.
    pub new_questions: usize,
    /// Band change, when both attempts have a band.
    pub band_delta: Option<f64>,
}

impl AttemptComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} → {} correct, {} newly correct, {} newly incorrect, {} unchanged\n\n",
            self.baseline_correct,
            self.current_correct,
            self.newly_correct.len(),
            self.newly_incorrect.len(),
            self.unchanged
        ));

        if let Some(delta) = self.band_delta {
            md.push_str(&format!("**Band change:** {delta:+.1}\n\n"));
        }

        if !self.newly_incorrect.is_empty() {
            md.push_str("### Newly incorrect\n\n");
            md.push_str(&format!("{}\n\n", self.newly_incorrect.join(", ")));
        }

        if !self.newly_correct.is_empty() {
            md.push_str("### Newly correct\n\n");
            md.push_str(&format!("{}\n", self.newly_correct.join(", ")));
        }

        md
    }

    /// Returns true if any question went from correct to incorrect.
    pub fn has_regressions(&self) -> bool {
        !self.newly_incorrect.is_empty()
    }
}
