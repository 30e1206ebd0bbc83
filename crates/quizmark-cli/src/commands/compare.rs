//! The `quizmark compare` command.

use std::path::PathBuf;

use anyhow::Result;

use quizmark_core::report::ScoreReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = ScoreReport::load_json(&baseline_path)?;
    let current = ScoreReport::load_json(&current_path)?;

    if baseline.test.id != current.test.id {
        tracing::warn!(
            "comparing attempts of different tests: {} vs {}",
            baseline.test.id,
            current.test.id
        );
    }

    let comparison = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} -> {} correct, {} newly correct, {} newly incorrect, {} unchanged",
                comparison.baseline_correct,
                comparison.current_correct,
                comparison.newly_correct.len(),
                comparison.newly_incorrect.len(),
                comparison.unchanged
            );

            if let Some(delta) = comparison.band_delta {
                println!("Band change: {delta:+.1}");
            }

            if !comparison.newly_incorrect.is_empty() {
                println!("\nNewly incorrect:");
                for id in &comparison.newly_incorrect {
                    println!("  Q{id}");
                }
            }

            if !comparison.newly_correct.is_empty() {
                println!("\nNewly correct:");
                for id in &comparison.newly_correct {
                    println!("  Q{id}");
                }
            }

            if comparison.new_questions > 0 {
                println!("\n{} new question(s)", comparison.new_questions);
            }
        }
    }

    if fail_on_regression && comparison.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
