//! Error types for the quizmark engine.
//!
//! Parsing and evaluation degrade malformed *content* into warnings or
//! "incorrect" outcomes; these errors cover the structural failures that
//! callers have to handle explicitly.

use thiserror::Error;

use crate::model::{BlockKind, Skill};

/// Errors raised while assembling a document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A block opened but the document ended before its closing sequence,
    /// and the parse options reject unterminated blocks.
    #[error("{kind} block opened at node {opened_at} is never closed (expected `{close}`)")]
    UnterminatedBlock {
        kind: BlockKind,
        opened_at: usize,
        close: &'static str,
    },
}

/// Errors raised by the answer store when a mutation would break the
/// declared shape of a question's answer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    /// A text/choice write targeted a multi-select question, or a toggle
    /// targeted a single-value question.
    #[error("question {question_id} expects {expected} answers")]
    KindMismatch {
        question_id: String,
        expected: &'static str,
    },

    /// A toggle was issued with a selection limit of zero.
    #[error("question {0} has no selectable slots")]
    NoSelections(String),

    /// The attempt was already finished and its answers are frozen.
    #[error("attempt is finished; answers can no longer change")]
    AttemptFinished,
}

/// Errors raised by the band converter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BandError {
    /// The skill is scored by an external grader, not a step table.
    #[error("{0} is scored by an external grader, not a band table")]
    NotTableScored(Skill),
}

/// Errors reported by an external grading collaborator.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The grader's output could not be parsed as JSON.
    #[error("grader returned malformed output: {0}")]
    MalformedOutput(String),

    /// The grader could not be reached or refused the request.
    #[error("grader unavailable: {0}")]
    Unavailable(String),

    /// The request was missing a required field.
    #[error("invalid grading request: {0}")]
    InvalidRequest(String),
}

impl GradingError {
    /// Returns `true` if retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            GradingError::InvalidRequest(_) | GradingError::MalformedOutput(_)
        )
    }
}
