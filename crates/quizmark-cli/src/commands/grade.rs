//! The `quizmark grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use serde::Deserialize;

use quizmark_core::grading::{grade_all, GradingRequest};
use quizmark_core::model::{Skill, TestDefinition};
use quizmark_core::parser;

use crate::config::QuizmarkConfig;
use crate::grader::CommandGrader;

/// One candidate response per section.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SectionResponse {
    /// A writing essay.
    Essay(String),
    /// Speaking turns as `[question, answer]` pairs.
    Turns(Vec<(String, String)>),
}

pub async fn execute(
    test_path: PathBuf,
    responses_path: PathBuf,
    output: PathBuf,
    config: &QuizmarkConfig,
) -> Result<()> {
    let grader_config = config
        .grader
        .as_ref()
        .context("no grader configured; add a [grader] table to quizmark.toml")?;

    let test = parser::parse_test_file(&test_path)?;
    anyhow::ensure!(
        !test.is_keyed(),
        "{} tests are scored against an answer key; use `quizmark score`",
        test.skill
    );

    let content = std::fs::read_to_string(&responses_path)
        .with_context(|| format!("failed to read responses: {}", responses_path.display()))?;
    let responses: Vec<SectionResponse> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse responses JSON: {}", responses_path.display()))?;
    anyhow::ensure!(
        responses.len() <= test.sections.len(),
        "{} responses for {} sections",
        responses.len(),
        test.sections.len()
    );
    if responses.len() < test.sections.len() {
        tracing::warn!(
            "only {} of {} sections have a response",
            responses.len(),
            test.sections.len()
        );
    }

    let requests = build_requests(&test, &responses)?;
    let grader = CommandGrader::new(grader_config);
    eprintln!(
        "Grading {} response(s) with {} ({} at a time)",
        requests.len(),
        grader_config.command,
        config.grading_parallelism
    );
    let results = grade_all(&grader, &requests, config.grading_parallelism).await;

    let mut table = Table::new();
    table.set_header(vec!["Section", "Band", "Status"]);
    let mut saved = Vec::new();
    for (section, result) in test.sections.iter().zip(&results) {
        match result {
            Ok(feedback) => {
                let band = feedback
                    .overall_band
                    .map(|b| format!("{b:.1}"))
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(&section.title),
                    Cell::new(band),
                    Cell::new("graded").fg(Color::Green),
                ]);
                saved.push(serde_json::json!({
                    "section": section.title,
                    "overall_band": feedback.overall_band,
                    "feedback": feedback.body,
                }));
            }
            Err(e) => {
                table.add_row(vec![
                    Cell::new(&section.title),
                    Cell::new("-"),
                    Cell::new(format!("failed: {e:#}")).fg(Color::Red),
                ]);
                saved.push(serde_json::json!({
                    "section": section.title,
                    "error": format!("{e:#}"),
                }));
            }
        }
    }
    println!("{table}");

    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let path = output.join(format!("{}-grading.json", test.id));
    std::fs::write(&path, serde_json::to_string_pretty(&saved)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Feedback saved to: {}", path.display());

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} response(s) could not be graded", results.len());
    }
    Ok(())
}

fn build_requests(
    test: &TestDefinition,
    responses: &[SectionResponse],
) -> Result<Vec<GradingRequest>> {
    test.sections
        .iter()
        .zip(responses)
        .enumerate()
        .map(|(index, (section, response))| match (test.skill, response) {
            (Skill::Writing, SectionResponse::Essay(essay)) => Ok(GradingRequest::writing(
                &section.content,
                section.sample_answer.as_deref(),
                essay,
            )),
            (Skill::Speaking, SectionResponse::Turns(turns)) => {
                Ok(GradingRequest::speaking(&section.content, turns))
            }
            (Skill::Writing, _) => {
                anyhow::bail!("response {} must be an essay string", index + 1)
            }
            (_, _) => anyhow::bail!(
                "response {} must be a list of [question, answer] pairs",
                index + 1
            ),
        })
        .collect()
}
