//! Subcommand implementations.

pub mod band;
pub mod compare;
pub mod grade;
pub mod init;
pub mod parse;
pub mod score;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use quizmark_core::model::TestDefinition;
use quizmark_core::parser;

/// Load one test file, or every test under a directory.
pub(crate) fn load_tests(path: &Path) -> Result<Vec<TestDefinition>> {
    if path.is_dir() {
        parser::load_test_directory(path)
    } else {
        Ok(vec![parser::parse_test_file(path)?])
    }
}
