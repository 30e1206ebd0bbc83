//! TOML test definition parser.
//!
//! Loads tests from TOML files and directories, and validates them against
//! their own content.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::answer_key::{AcceptedAnswer, AnswerKey};
use crate::identity::compare_ids;
use crate::model::{Section, Skill, TestDefinition};

/// Intermediate TOML structure for parsing test files.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    test: TomlTestHeader,
    #[serde(default)]
    sections: Vec<TomlSection>,
    #[serde(default)]
    answers: BTreeMap<String, AcceptedAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlTestHeader {
    id: String,
    title: String,
    skill: String,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: Option<String>,
    /// Path of an HTML file, relative to the test file.
    #[serde(default)]
    content_file: Option<String>,
    /// Ordered answers for this section's questions.
    #[serde(default)]
    answers: Vec<String>,
    /// Exemplar response handed to external graders.
    #[serde(default)]
    sample_answer: Option<String>,
}

/// Parse a single TOML file into a `TestDefinition`.
pub fn parse_test_file(path: &Path) -> Result<TestDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file: {}", path.display()))?;

    parse_test_str(&content, path)
}

/// Parse a TOML string into a `TestDefinition`. `source_path` names the file
/// in errors and anchors relative `content_file` paths.
pub fn parse_test_str(content: &str, source_path: &Path) -> Result<TestDefinition> {
    let parsed: TomlTestFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let skill: Skill = parsed
        .test
        .skill
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let base_dir = source_path.parent().unwrap_or_else(|| Path::new("."));
    let section_answers: Vec<Vec<String>> =
        parsed.sections.iter().map(|s| s.answers.clone()).collect();

    let sections = parsed
        .sections
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            let content = match (s.content, s.content_file) {
                (Some(content), None) => content,
                (None, Some(file)) => {
                    let path = base_dir.join(&file);
                    std::fs::read_to_string(&path).with_context(|| {
                        format!("failed to read section content: {}", path.display())
                    })?
                }
                (Some(_), Some(_)) => anyhow::bail!(
                    "section {} sets both content and content_file",
                    index + 1
                ),
                (None, None) => anyhow::bail!(
                    "section {} needs either content or content_file",
                    index + 1
                ),
            };
            Ok(Section {
                title: s.title,
                content,
                sample_answer: s.sample_answer,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut answer_key = AnswerKey::from_section_arrays(&section_answers);
    for (id, accepted) in parsed.answers {
        answer_key.insert(&id, accepted);
    }

    Ok(TestDefinition {
        id: parsed.test.id,
        title: parsed.test.title,
        skill,
        sections,
        answer_key,
    })
}

/// Recursively load all `.toml` test files from a directory.
pub fn load_test_directory(dir: &Path) -> Result<Vec<TestDefinition>> {
    let mut tests = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            tests.extend(load_test_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test_file(&path) {
                Ok(test) => tests.push(test),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    tests.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(tests)
}

/// A warning from test validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Title of the section concerned, if any.
    pub section: Option<String>,
    /// The question concerned, if any.
    pub question_id: Option<String>,
    pub message: String,
}

/// Validate a test for authoring mistakes.
pub fn validate_test(test: &TestDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if test.sections.is_empty() {
        warnings.push(ValidationWarning {
            section: None,
            question_id: None,
            message: "test has no sections".into(),
        });
    }

    let documents = test.documents();

    // Parse warnings, per section
    for (section, document) in test.sections.iter().zip(&documents) {
        for warning in &document.warnings {
            warnings.push(ValidationWarning {
                section: Some(section.title.clone()),
                question_id: None,
                message: warning.to_string(),
            });
        }
    }

    // Duplicate identifiers across sections
    let mut seen = HashSet::new();
    let mut content_ids = Vec::new();
    for (section, document) in test.sections.iter().zip(&documents) {
        let mut local = HashSet::new();
        for id in document.question_ids() {
            if !local.insert(id) {
                continue; // already reported by the section's parse warnings
            }
            if !seen.insert(id.to_string()) {
                warnings.push(ValidationWarning {
                    section: Some(section.title.clone()),
                    question_id: Some(id.to_string()),
                    message: format!("question {id} also appears in an earlier section"),
                });
            }
            content_ids.push(id.to_string());
        }
    }

    if !test.is_keyed() {
        return warnings;
    }

    if test.answer_key.is_empty() {
        warnings.push(ValidationWarning {
            section: None,
            question_id: None,
            message: "answer key is empty".into(),
        });
        return warnings;
    }

    // Multi-choice blocks need a group key or one entry per question
    let mut grouped = HashSet::new();
    for (section, document) in test.sections.iter().zip(&documents) {
        for node in document.multi_choice_groups() {
            let ids = node.question_ids();
            grouped.extend(ids.iter().map(|id| id.to_string()));
            let Some(group_key) = node.answer_key() else {
                continue;
            };
            let covered = test.answer_key.contains(&group_key)
                || ids.iter().all(|id| test.answer_key.contains(id));
            if !covered {
                warnings.push(ValidationWarning {
                    section: Some(section.title.clone()),
                    question_id: Some(group_key.clone()),
                    message: format!("multi-choice block {group_key} has no answer key entry"),
                });
            }
        }
    }

    let keyed: HashSet<String> = test.answer_key.question_ids().into_iter().collect();
    let mut missing: Vec<&String> = content_ids
        .iter()
        .filter(|id| !keyed.contains(*id) && !grouped.contains(*id))
        .collect();
    missing.sort_by(|a, b| compare_ids(a, b));
    for id in missing {
        warnings.push(ValidationWarning {
            section: None,
            question_id: Some(id.clone()),
            message: format!("question {id} has no answer key entry"),
        });
    }

    let in_content: HashSet<&String> = content_ids.iter().collect();
    for id in test.answer_key.question_ids() {
        if !in_content.contains(&id) {
            warnings.push(ValidationWarning {
                section: None,
                message: format!("answer key entry {id} matches no question in the content"),
                question_id: Some(id),
            });
        }
    }

    warnings
}
