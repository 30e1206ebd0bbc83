//! Core data model types for quizmark.
//!
//! A parsed [`Document`] is an ordered list of [`RenderNode`]s: pass-through
//! markup interleaved with typed question definitions that carry enough
//! structure to render a control and to score a submission later.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::answer_key::AnswerKey;

/// Exam skill a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skill::Listening => write!(f, "listening"),
            Skill::Reading => write!(f, "reading"),
            Skill::Writing => write!(f, "writing"),
            Skill::Speaking => write!(f, "speaking"),
        }
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "listening" | "l" => Ok(Skill::Listening),
            "reading" | "r" => Ok(Skill::Reading),
            "writing" | "w" => Ok(Skill::Writing),
            "speaking" | "s" => Ok(Skill::Speaking),
            other => Err(format!("unknown skill: {other}")),
        }
    }
}

/// The four delimited block constructs of the authoring markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    MultiChoice,
    SingleChoice,
    Judgment,
    Matching,
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::MultiChoice,
        BlockKind::SingleChoice,
        BlockKind::Judgment,
        BlockKind::Matching,
    ];

    /// The literal opening sequence.
    pub fn open(self) -> &'static str {
        match self {
            BlockKind::MultiChoice => "-[",
            BlockKind::SingleChoice => "-(",
            BlockKind::Judgment => "-$",
            BlockKind::Matching => "-%",
        }
    }

    /// The literal closing sequence.
    pub fn close(self) -> &'static str {
        match self {
            BlockKind::MultiChoice => "-]",
            BlockKind::SingleChoice => "-)",
            BlockKind::Judgment => "-$",
            BlockKind::Matching => "-%",
        }
    }

    /// Which block, if any, a node's trimmed text opens.
    pub fn opened_by(text: &str) -> Option<BlockKind> {
        let trimmed = text.trim_start();
        BlockKind::ALL
            .into_iter()
            .find(|kind| trimmed.starts_with(kind.open()))
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::MultiChoice => write!(f, "multi-choice"),
            BlockKind::SingleChoice => write!(f, "single-choice"),
            BlockKind::Judgment => write!(f, "judgment"),
            BlockKind::Matching => write!(f, "matching"),
        }
    }
}

/// Whether a choice question takes one or several selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceKind {
    Single,
    Multiple,
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Markup shown next to the control.
    pub display_markup: String,
    /// Value stored when the option is selected (usually an upper-case letter).
    pub value: String,
}

/// Categories offered by a true/false/not-given statement.
pub const TRUE_FALSE_NOT_GIVEN: [&str; 3] = ["TRUE", "FALSE", "NOT GIVEN"];
/// Categories offered by a yes/no/not-given statement.
pub const YES_NO_NOT_GIVEN: [&str; 3] = ["YES", "NO", "NOT GIVEN"];

/// A table cell: an ordered run of render nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub nodes: Vec<RenderNode>,
}

/// One unit of a parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderNode {
    /// Authored markup emitted unchanged.
    Passthrough { markup: String },
    /// A fill-in text input bound to one question.
    InlineBlank { question_id: String },
    /// A single- or multiple-choice block.
    Choice {
        question_ids: Vec<String>,
        stem_markup: String,
        options: Vec<ChoiceOption>,
        kind: ChoiceKind,
        max_selections: usize,
    },
    /// A three-way classification statement.
    Judgment {
        question_id: String,
        stem_markup: String,
        categories: Vec<String>,
    },
    /// A matching prompt answered with a free-text label.
    Matching {
        question_id: String,
        prompt_markup: String,
    },
    /// A figure table whose cells contain inline blanks.
    Table {
        header: Vec<Cell>,
        rows: Vec<Vec<Cell>>,
    },
}

impl RenderNode {
    /// Question identifiers introduced by this node, in document order.
    pub fn question_ids(&self) -> Vec<&str> {
        match self {
            RenderNode::Passthrough { .. } => vec![],
            RenderNode::InlineBlank { question_id }
            | RenderNode::Judgment { question_id, .. }
            | RenderNode::Matching { question_id, .. } => vec![question_id.as_str()],
            RenderNode::Choice { question_ids, .. } => {
                question_ids.iter().map(String::as_str).collect()
            }
            RenderNode::Table { header, rows } => header
                .iter()
                .chain(rows.iter().flatten())
                .flat_map(|cell| cell.nodes.iter())
                .flat_map(RenderNode::question_ids)
                .collect(),
        }
    }

    /// Key under which the answer store records this node's answer, if it is
    /// a single question. Tables hold several keys and return `None`.
    pub fn answer_key(&self) -> Option<String> {
        match self {
            RenderNode::Passthrough { .. } | RenderNode::Table { .. } => None,
            RenderNode::InlineBlank { question_id }
            | RenderNode::Judgment { question_id, .. }
            | RenderNode::Matching { question_id, .. } => Some(question_id.clone()),
            RenderNode::Choice { question_ids, .. } => Some(question_ids.join(",")),
        }
    }

    pub fn is_question(&self) -> bool {
        !matches!(self, RenderNode::Passthrough { .. })
    }
}

/// How inline blanks in a document are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankNumbering {
    /// Every blank is bound to the `Q<n>` written right before it.
    #[default]
    Explicit,
    /// Legacy documents: bare `{}` blanks are numbered 1, 2, 3, ... by position.
    Sequential,
}

/// Category of a non-fatal parse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingQuestionNumber,
    UnterminatedBlock,
    NoOptions,
    UnnumberedBlank,
    DuplicateQuestion,
}

/// A non-fatal problem authors should fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub kind: WarningKind,
    pub message: String,
    /// A short excerpt of the offending content.
    #[serde(default)]
    pub context: String,
}

impl ParseWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>, context: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            context: excerpt(context),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (near \"{}\")", self.message, self.context)
        }
    }
}

fn excerpt(s: &str) -> String {
    let flat: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 60 {
        let cut: String = flat.chars().take(57).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

/// What to do when a block is still open at the end of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnterminatedPolicy {
    /// Swallow the remaining nodes into the block and record a warning.
    #[default]
    Consume,
    /// Fail the parse.
    Reject,
}

/// Options controlling document assembly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub unterminated: UnterminatedPolicy,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            unterminated: UnterminatedPolicy::Reject,
        }
    }
}

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<RenderNode>,
    #[serde(default)]
    pub warnings: Vec<ParseWarning>,
    #[serde(default)]
    pub numbering: BlankNumbering,
}

impl Document {
    /// Every question identifier in document order, duplicates included.
    pub fn question_ids(&self) -> Vec<&str> {
        self.nodes.iter().flat_map(RenderNode::question_ids).collect()
    }

    /// Question nodes only.
    pub fn questions(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.iter().filter(|n| n.is_question())
    }

    /// Multi-select choice nodes, whose answers are grouped under one key.
    pub fn multi_choice_groups(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.iter().filter(|n| {
            matches!(
                n,
                RenderNode::Choice {
                    kind: ChoiceKind::Multiple,
                    ..
                }
            )
        })
    }
}

/// One titled section of authored content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    /// Rich-text markup with embedded question syntax.
    pub content: String,
    /// Exemplar response for externally graded sections.
    #[serde(default)]
    pub sample_answer: Option<String>,
}

/// A complete authored test: content plus answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub title: String,
    pub skill: Skill,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub answer_key: AnswerKey,
}

impl TestDefinition {
    /// Parse every section with the default options.
    pub fn documents(&self) -> Vec<Document> {
        self.sections
            .iter()
            .map(|s| crate::assembler::parse_document(&s.content))
            .collect()
    }

    /// Parse every section, failing on the first structural error.
    pub fn documents_with(
        &self,
        options: ParseOptions,
    ) -> Result<Vec<Document>, crate::error::ParseError> {
        self.sections
            .iter()
            .map(|s| crate::assembler::parse_document_with(&s.content, options))
            .collect()
    }

    /// Whether answers are scored against a key rather than by a grader.
    pub fn is_keyed(&self) -> bool {
        matches!(self.skill, Skill::Listening | Skill::Reading)
    }
}
