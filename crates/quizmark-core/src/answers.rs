//! The candidate's answer store and the events that mutate it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AnswerError;
use crate::identity::canonical_id;
use crate::model::{ChoiceKind, Document, RenderNode};

/// A submitted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Fill-blank, single-choice, judgment and matching answers.
    Text(String),
    /// Multi-select answers, kept sorted.
    Choices(Vec<String>),
}

impl Answer {
    /// Whether nothing meaningful was submitted.
    pub fn is_blank(&self) -> bool {
        match self {
            Answer::Text(text) => text.trim().is_empty(),
            Answer::Choices(choices) => choices.iter().all(|c| c.trim().is_empty()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Answer::Text(text) => text.clone(),
            Answer::Choices(choices) => choices.join(", "),
        }
    }
}

/// The declared answer shape of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    Text,
    Choices,
}

/// One discrete answer change, as recorded by a UI event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AnswerEvent {
    SetText {
        question_id: String,
        value: String,
    },
    SetChoice {
        question_id: String,
        value: String,
    },
    Toggle {
        question_id: String,
        option: String,
        selected: bool,
        max_selections: usize,
    },
    Reset,
}

/// Mapping from question identifier to the current answer.
///
/// Serializes as a plain JSON object; declared shapes are not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    entries: BTreeMap<String, Answer>,
    #[serde(skip)]
    shapes: BTreeMap<String, AnswerShape>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that knows the answer shape of every question in
    /// `document`, so writes of the wrong shape are refused.
    pub fn for_document(document: &Document) -> Self {
        Self::for_documents(std::slice::from_ref(document))
    }

    /// Like [`AnswerStore::for_document`], across every section of a test.
    pub fn for_documents(documents: &[Document]) -> Self {
        let mut store = Self::default();
        for node in documents.iter().flat_map(|d| &d.nodes) {
            store.declare(node);
        }
        store
    }

    fn declare(&mut self, node: &RenderNode) {
        match node {
            RenderNode::Choice {
                kind: ChoiceKind::Multiple,
                ..
            } => {
                if let Some(key) = node.answer_key() {
                    self.shapes.insert(key, AnswerShape::Choices);
                }
            }
            RenderNode::Table { header, rows } => {
                for cell in header.iter().chain(rows.iter().flatten()) {
                    for inner in &cell.nodes {
                        self.declare(inner);
                    }
                }
            }
            other => {
                if let Some(key) = other.answer_key() {
                    self.shapes.insert(key, AnswerShape::Text);
                }
            }
        }
    }

    /// Build a store from already-keyed entries, canonicalizing identifiers.
    pub fn from_entries<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, Answer)>) -> Self {
        let mut store = Self::default();
        for (id, mut answer) in entries {
            if let Answer::Choices(choices) = &mut answer {
                choices.sort();
                choices.dedup();
            }
            store.entries.insert(canonical_id(id.as_ref()), answer);
        }
        store
    }

    /// Build a store from answers submitted in question order, numbered
    /// from 1. Blank entries leave their question unanswered.
    pub fn from_ordered<S: AsRef<str>>(answers: &[S]) -> Self {
        let mut store = Self::default();
        for (index, value) in answers.iter().enumerate() {
            if !value.as_ref().trim().is_empty() {
                store
                    .entries
                    .insert((index + 1).to_string(), Answer::Text(value.as_ref().to_string()));
            }
        }
        store
    }

    pub fn shape_of(&self, id: &str) -> Option<AnswerShape> {
        self.shapes.get(id).copied()
    }

    fn require_shape(&self, id: &str, shape: AnswerShape) -> Result<(), AnswerError> {
        let declared = self.shape_of(id).or_else(|| {
            self.entries.get(id).map(|answer| match answer {
                Answer::Text(_) => AnswerShape::Text,
                Answer::Choices(_) => AnswerShape::Choices,
            })
        });
        match declared {
            Some(declared) if declared != shape => Err(AnswerError::KindMismatch {
                question_id: id.to_string(),
                expected: match declared {
                    AnswerShape::Text => "single-value",
                    AnswerShape::Choices => "multi-select",
                },
            }),
            _ => Ok(()),
        }
    }

    /// Overwrite the text answer of a fill-in question.
    pub fn set_text(&mut self, question_id: &str, value: &str) -> Result<(), AnswerError> {
        let id = canonical_id(question_id);
        self.require_shape(&id, AnswerShape::Text)?;
        self.entries.insert(id, Answer::Text(value.to_string()));
        Ok(())
    }

    /// Overwrite the selection of a single-choice, judgment or matching question.
    pub fn set_choice(&mut self, question_id: &str, value: &str) -> Result<(), AnswerError> {
        self.set_text(question_id, value)
    }

    /// Select or deselect an option of a multi-select question.
    ///
    /// Selecting beyond `max_selections` is refused without error; the
    /// return value reports whether the stored selection changed.
    pub fn toggle_multi_choice(
        &mut self,
        question_id: &str,
        option: &str,
        selected: bool,
        max_selections: usize,
    ) -> Result<bool, AnswerError> {
        let id = canonical_id(question_id);
        if max_selections == 0 {
            return Err(AnswerError::NoSelections(id));
        }
        self.require_shape(&id, AnswerShape::Choices)?;

        let entry = self
            .entries
            .entry(id)
            .or_insert_with(|| Answer::Choices(Vec::new()));
        let Answer::Choices(choices) = entry else {
            return Ok(false);
        };
        let position = choices.iter().position(|c| c == option);
        match (selected, position) {
            (true, Some(_)) | (false, None) => Ok(false),
            (true, None) if choices.len() >= max_selections => {
                tracing::debug!(question_id, option, max_selections, "selection limit reached");
                Ok(false)
            }
            (true, None) => {
                choices.push(option.to_string());
                choices.sort();
                Ok(true)
            }
            (false, Some(at)) => {
                choices.remove(at);
                Ok(true)
            }
        }
    }

    /// Clear every answer. Declared shapes are kept.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Apply a recorded event. Returns whether the store changed.
    pub fn apply(&mut self, event: &AnswerEvent) -> Result<bool, AnswerError> {
        match event {
            AnswerEvent::SetText { question_id, value } => {
                self.set_text(question_id, value).map(|()| true)
            }
            AnswerEvent::SetChoice { question_id, value } => {
                self.set_choice(question_id, value).map(|()| true)
            }
            AnswerEvent::Toggle {
                question_id,
                option,
                selected,
                max_selections,
            } => self.toggle_multi_choice(question_id, option, *selected, *max_selections),
            AnswerEvent::Reset => {
                let changed = !self.entries.is_empty();
                self.reset();
                Ok(changed)
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Answer> {
        self.entries.get(id)
    }

    /// The multi-question entry (key such as `"11,12"`) that covers `id`.
    pub fn group_for(&self, id: &str) -> Option<(&str, &Answer)> {
        self.entries
            .iter()
            .find(|(key, _)| key.contains(',') && key.split(',').any(|part| part == id))
            .map(|(key, answer)| (key.as_str(), answer))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.entries.iter().map(|(id, answer)| (id.as_str(), answer))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
