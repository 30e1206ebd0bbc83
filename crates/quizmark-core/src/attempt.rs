//! One candidate attempt: an answer store that is frozen and scored exactly
//! once, however many times finishing is requested.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::answer_key::AnswerKey;
use crate::answers::{AnswerEvent, AnswerStore};
use crate::error::AnswerError;
use crate::evaluator::evaluate;
use crate::model::{Document, Skill};
use crate::results::ScoreResult;

impl From<AnswerStore> for Attempt {
    fn from(store: AnswerStore) -> Self {
        Self {
            store,
            finished: None,
        }
    }
}

/// What ended the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Manual,
    Timeout,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Manual => write!(f, "manual"),
            FinishReason::Timeout => write!(f, "timeout"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(FinishReason::Manual),
            "timeout" => Ok(FinishReason::Timeout),
            other => Err(format!("unknown finish reason: {other}")),
        }
    }
}

/// The frozen outcome of a finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedAttempt {
    pub reason: FinishReason,
    pub result: ScoreResult,
}

/// Result of a finish request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finish<'a> {
    /// This call evaluated the attempt.
    Finished(&'a FinishedAttempt),
    /// An earlier call already did; nothing was re-evaluated.
    AlreadyFinished(&'a FinishedAttempt),
}

impl<'a> Finish<'a> {
    pub fn outcome(self) -> &'a FinishedAttempt {
        match self {
            Finish::Finished(outcome) | Finish::AlreadyFinished(outcome) => outcome,
        }
    }

    pub fn is_first(self) -> bool {
        matches!(self, Finish::Finished(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Attempt {
    store: AnswerStore,
    finished: Option<FinishedAttempt>,
}

impl Attempt {
    /// Start an attempt with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an attempt whose store knows the document's answer shapes.
    pub fn for_document(document: &Document) -> Self {
        Self {
            store: AnswerStore::for_document(document),
            finished: None,
        }
    }

    /// Start an attempt covering several section documents.
    pub fn for_documents(documents: &[Document]) -> Self {
        Self {
            store: AnswerStore::for_documents(documents),
            finished: None,
        }
    }

    pub fn store(&self) -> &AnswerStore {
        &self.store
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn finished(&self) -> Option<&FinishedAttempt> {
        self.finished.as_ref()
    }

    /// Apply an answer change. Refused once the attempt is finished.
    pub fn apply(&mut self, event: &AnswerEvent) -> Result<bool, AnswerError> {
        if self.is_finished() {
            return Err(AnswerError::AttemptFinished);
        }
        self.store.apply(event)
    }

    /// Evaluate and freeze the attempt. A timeout racing a manual finish
    /// gets the frozen result back instead of a second evaluation.
    pub fn finish(&mut self, key: &AnswerKey, skill: Skill, reason: FinishReason) -> Finish<'_> {
        let first = self.finished.is_none();
        let store = &self.store;
        let outcome = self.finished.get_or_insert_with(|| {
            let result = evaluate(store, key, skill);
            tracing::info!(
                %reason,
                correct = result.correct_count,
                total = result.total_questions,
                "attempt finished"
            );
            FinishedAttempt { reason, result }
        });
        if first {
            Finish::Finished(outcome)
        } else {
            tracing::debug!(%reason, "attempt already finished");
            Finish::AlreadyFinished(outcome)
        }
    }

    /// Discard answers and any result, starting over.
    pub fn restart(&mut self) {
        self.store.reset();
        self.finished = None;
    }
}
