//! The `quizmark score` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use serde::Deserialize;

use quizmark_core::answers::{Answer, AnswerEvent, AnswerStore};
use quizmark_core::attempt::{Attempt, FinishReason};
use quizmark_core::model::{Document, ParseOptions, TestDefinition};
use quizmark_core::parser;
use quizmark_core::report::ScoreReport;
use quizmark_core::results::ScoreResult;
use quizmark_report::html::write_html_report;

use super::band::tier_color;

/// Accepted layouts of an answers file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswersFile {
    /// `{"1": "fish", "11,12": ["A", "C"]}`
    Keyed(BTreeMap<String, Answer>),
    /// A recorded UI event log, replayed in order.
    Events(Vec<AnswerEvent>),
    /// Answers in question order, numbered from 1.
    Ordered(Vec<String>),
}

pub struct ScoreArgs {
    pub test: PathBuf,
    pub answers: PathBuf,
    pub reason: FinishReason,
    pub output: PathBuf,
    pub format: String,
    pub options: ParseOptions,
}

pub fn execute(args: ScoreArgs) -> Result<()> {
    let test = parser::parse_test_file(&args.test)?;
    anyhow::ensure!(
        test.is_keyed(),
        "{} tests are graded externally; use `quizmark grade`",
        test.skill
    );

    let documents = test
        .documents_with(args.options)
        .with_context(|| format!("failed to parse {}", args.test.display()))?;
    for (section, document) in test.sections.iter().zip(&documents) {
        for warning in &document.warnings {
            tracing::warn!(section = %section.title, "{warning}");
        }
    }

    let mut attempt = load_attempt(&args.answers, &documents)?;
    let finished = attempt
        .finish(&test.answer_key, test.skill, args.reason)
        .outcome()
        .clone();

    print_result(&test, &finished.result);

    let report = ScoreReport::new(&test, finished.reason, finished.result);
    write_outputs(&report, &args.output, &args.format)
}

fn load_attempt(path: &Path, documents: &[Document]) -> Result<Attempt> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    let file: AnswersFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers JSON: {}", path.display()))?;

    let attempt = match file {
        AnswersFile::Keyed(entries) => Attempt::from(AnswerStore::from_entries(entries)),
        AnswersFile::Ordered(values) => {
            Attempt::from(AnswerStore::from_ordered(values.as_slice()))
        }
        AnswersFile::Events(events) => {
            let mut attempt = Attempt::for_documents(documents);
            for (index, event) in events.iter().enumerate() {
                if let Err(e) = attempt.apply(event) {
                    tracing::warn!("ignoring answer event {}: {e}", index + 1);
                }
            }
            attempt
        }
    };
    tracing::debug!(answers = attempt.store().len(), "answers loaded");
    Ok(attempt)
}

fn print_result(test: &TestDefinition, result: &ScoreResult) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Your answer", "Accepted", "Result"]);

    for outcome in &result.per_question {
        let submitted = outcome
            .submitted
            .as_ref()
            .filter(|a| !a.is_blank())
            .map(Answer::display)
            .unwrap_or_else(|| "-".to_string());
        let verdict = if outcome.correct {
            Cell::new("correct").fg(Color::Green)
        } else {
            Cell::new("incorrect").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&outcome.question_id),
            Cell::new(submitted),
            Cell::new(outcome.accepted.display()),
            verdict,
        ]);
    }

    eprintln!("{table}");

    let mut summary = Table::new();
    summary.set_header(vec!["Test", "Skill", "Correct", "Unanswered", "Score", "Band"]);
    let band = match (result.band, result.band_tier) {
        (Some(band), Some(tier)) => Cell::new(format!("{band:.1} ({tier})")).fg(tier_color(tier)),
        (Some(band), None) => Cell::new(format!("{band:.1}")),
        _ => Cell::new("-"),
    };
    summary.add_row(vec![
        Cell::new(&test.title),
        Cell::new(test.skill),
        Cell::new(format!("{}/{}", result.correct_count, result.total_questions)),
        Cell::new(result.unanswered_count()),
        Cell::new(format!("{:.1}%", result.percentage)),
        band,
    ]);
    println!("{summary}");
    println!("Score: {}", result.summary());

    let review: Vec<String> = result
        .incorrect()
        .map(|outcome| format!("Q{}", outcome.question_id))
        .collect();
    if !review.is_empty() {
        println!("Review: {}", review.join(", "));
    }
}

fn write_outputs(report: &ScoreReport, output: &Path, format: &str) -> Result<()> {
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(report.file_name());
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(report.file_name()).with_extension("html");
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "none" => {}
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}
