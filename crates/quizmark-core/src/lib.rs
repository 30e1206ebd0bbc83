//! quizmark-core: question markup parser and answer evaluation engine.
//!
//! Authored rich text with embedded question markup is parsed into an
//! ordered [`model::Document`] of render nodes. Candidate answers collect in
//! an [`answers::AnswerStore`], are scored against an
//! [`answer_key::AnswerKey`] by the [`evaluator`] and converted to a band by
//! the [`band`] tables.

pub mod answer_key;
pub mod answers;
pub mod assembler;
pub mod attempt;
pub mod band;
pub mod blocks;
pub mod error;
pub mod evaluator;
pub mod grading;
pub mod identity;
pub mod markup;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod scanner;
