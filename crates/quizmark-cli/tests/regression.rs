//! Attempt comparison tests.
//!
//! Scores two attempts of the same test through the CLI, then compares the
//! saved reports.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizmark() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizmark").unwrap();
    cmd.env_remove("QUIZMARK_OUTPUT_DIR")
        .env_remove("QUIZMARK_STRICT");
    cmd
}

/// Score `answers` against the listening test and return the saved report.
fn score(answers: &str, out: &Path) -> PathBuf {
    quizmark()
        .arg("score")
        .arg("--test")
        .arg("../../test-sets/listening/practice-1.toml")
        .arg("--answers")
        .arg(format!("../../test-sets/answers/{answers}"))
        .arg("--output")
        .arg(out)
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    let mut reports: Vec<PathBuf> = std::fs::read_dir(out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1);
    reports.remove(0)
}

fn scored_pair() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first");
    let retake = dir.path().join("retake");
    std::fs::create_dir_all(&first).unwrap();
    std::fs::create_dir_all(&retake).unwrap();
    let first = score("listening-practice-1.json", &first);
    let retake = score("listening-practice-1-retake.json", &retake);
    (dir, first, retake)
}

#[test]
fn retake_reports_changes_per_question() {
    let (_dir, first, retake) = scored_pair();

    quizmark()
        .arg("compare")
        .arg("--baseline")
        .arg(&first)
        .arg("--current")
        .arg(&retake)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "6 -> 7 correct, 2 newly correct, 1 newly incorrect, 5 unchanged",
        ))
        .stdout(predicate::str::contains("Band change: +1.0"))
        .stdout(predicate::str::contains("Newly incorrect:\n  Q4"));
}

#[test]
fn fail_on_regression_sets_exit_code() {
    let (_dir, first, retake) = scored_pair();

    quizmark()
        .arg("compare")
        .arg("--baseline")
        .arg(&first)
        .arg("--current")
        .arg(&retake)
        .arg("--fail-on-regression")
        .assert()
        .failure();
}

#[test]
fn identical_reports_have_no_regressions() {
    let (_dir, first, _retake) = scored_pair();

    quizmark()
        .arg("compare")
        .arg("--baseline")
        .arg(&first)
        .arg("--current")
        .arg(&first)
        .arg("--fail-on-regression")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 newly incorrect, 8 unchanged"));
}

#[test]
fn comparison_as_json_and_markdown() {
    let (_dir, first, retake) = scored_pair();

    let output = quizmark()
        .arg("compare")
        .arg("--baseline")
        .arg(&retake)
        .arg("--current")
        .arg(&first)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let comparison: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(comparison["newly_correct"], serde_json::json!(["4"]));
    assert_eq!(comparison["newly_incorrect"], serde_json::json!(["3", "6"]));
    assert_eq!(comparison["band_delta"], -1.0);

    quizmark()
        .arg("compare")
        .arg("--baseline")
        .arg(&retake)
        .arg("--current")
        .arg(&first)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("### Newly incorrect"))
        .stdout(predicate::str::contains("3, 6"));
}
