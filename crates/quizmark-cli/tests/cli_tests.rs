//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn quizmark() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizmark").unwrap();
    cmd.env_remove("QUIZMARK_OUTPUT_DIR")
        .env_remove("QUIZMARK_STRICT")
        .env_remove("RUST_LOG");
    cmd
}

fn reports_in(dir: &Path, extension: &str) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == extension))
        .collect()
}

#[test]
fn validate_listening_test() {
    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg("../../test-sets/listening/practice-1.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 sections, 8 keyed questions"))
        .stdout(predicate::str::contains("All tests valid"));
}

#[test]
fn validate_directory() {
    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg("../../test-sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Listening Practice 1"))
        .stdout(predicate::str::contains("Reading Practice 1"))
        .stdout(predicate::str::contains("Writing Task 1"))
        .stdout(predicate::str::contains("All tests valid"));
}

#[test]
fn validate_reports_missing_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"[test]
id = "broken"
title = "Broken"
skill = "listening"

[[sections]]
title = "Part 1"
content = "<p>Name: Q1 {}</p><p>Age: Q2 {}</p>"
answers = ["Smith"]
"#,
    )
    .unwrap();

    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("question 2 has no answer key entry"));

    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg(&path)
        .arg("--deny-warnings")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--deny-warnings"));
}

#[test]
fn validate_strict_rejects_unterminated_block() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("open.toml");
    std::fs::write(
        &path,
        r#"[test]
id = "open"
title = "Open block"
skill = "reading"

[[sections]]
title = "Passage"
content = "<p>-( Q1 Pick one</p><p>@A yes</p><p>@B no</p>"

[answers]
"1" = "A"
"#,
    )
    .unwrap();

    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("never closed"));

    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg(&path)
        .arg("--strict")
        .assert()
        .failure()
        .stdout(predicate::str::contains("ERROR"));
}

#[test]
fn validate_nonexistent_file() {
    quizmark()
        .arg("validate")
        .arg("--test-set")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn parse_prints_question_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("part.html");
    std::fs::write(
        &path,
        "<p>Name: Q1 {}</p><p>-( Q2 Where? @A here @B there -)</p><p>-$ Q3 Rain is wet. -$</p>",
    )
    .unwrap();

    quizmark()
        .arg("parse")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 question(s)"))
        .stdout(predicate::str::contains("single choice"))
        .stdout(predicate::str::contains("TRUE / FALSE / NOT GIVEN"));
}

#[test]
fn parse_json_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("part.html");
    std::fs::write(&path, "<p>Name: Q7 {}</p>").unwrap();

    let output = quizmark()
        .arg("parse")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let blank = doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["type"] == "inline_blank")
        .unwrap();
    assert_eq!(blank["question_id"], "7");
}

#[test]
fn score_listening_attempt() {
    let out = TempDir::new().unwrap();

    quizmark()
        .arg("score")
        .arg("--test")
        .arg("../../test-sets/listening/practice-1.toml")
        .arg("--answers")
        .arg("../../test-sets/answers/listening-practice-1.json")
        .arg("--output")
        .arg(out.path())
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 6/8 (75.0%) band 7.0"))
        .stdout(predicate::str::contains("Review: Q3, Q6"));

    let json = reports_in(out.path(), "json");
    assert_eq!(json.len(), 1);
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json[0]).unwrap()).unwrap();
    assert_eq!(report["test"]["id"], "listening-practice-1");
    assert_eq!(report["finish_reason"], "manual");
    assert_eq!(report["result"]["correct_count"], 6);

    assert_eq!(reports_in(out.path(), "html").len(), 1);
}

#[test]
fn score_event_log_with_timeout() {
    let out = TempDir::new().unwrap();

    quizmark()
        .arg("score")
        .arg("--test")
        .arg("../../test-sets/listening/practice-1.toml")
        .arg("--answers")
        .arg("../../test-sets/answers/listening-practice-1-retake.json")
        .arg("--reason")
        .arg("timeout")
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 7/8 (87.5%) band 8.0"));

    let json = reports_in(out.path(), "json");
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json[0]).unwrap()).unwrap();
    assert_eq!(report["finish_reason"], "timeout");
}

#[test]
fn score_reading_from_content_file() {
    let out = TempDir::new().unwrap();

    quizmark()
        .arg("score")
        .arg("--test")
        .arg("../../test-sets/reading/practice-1.toml")
        .arg("--answers")
        .arg("../../test-sets/answers/reading-practice-1.json")
        .arg("--output")
        .arg(out.path())
        .arg("--format")
        .arg("none")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 4/6 (66.7%) band 6.5"));

    assert!(reports_in(out.path(), "json").is_empty());
}

#[test]
fn score_refuses_writing_tests() {
    let out = TempDir::new().unwrap();

    quizmark()
        .arg("score")
        .arg("--test")
        .arg("../../test-sets/writing/task-1.toml")
        .arg("--answers")
        .arg("../../test-sets/answers/writing-task-1.json")
        .arg("--output")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("quizmark grade"));
}

#[test]
fn grade_requires_configured_grader() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("quizmark.toml");
    std::fs::write(&config, "output_dir = \"out\"\n").unwrap();

    quizmark()
        .arg("grade")
        .arg("--config")
        .arg(&config)
        .arg("--test")
        .arg("../../test-sets/writing/task-1.toml")
        .arg("--responses")
        .arg("../../test-sets/answers/writing-task-1.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no grader configured"));
}

#[cfg(unix)]
#[test]
fn grade_with_command_grader() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("quizmark.toml");
    std::fs::write(
        &config,
        r#"grading_parallelism = 1

[grader]
command = "sh"
args = ["-c", "cat > /dev/null; echo '{\"scores\": {\"overall\": 6.5}}'"]
"#,
    )
    .unwrap();

    quizmark()
        .arg("grade")
        .arg("--config")
        .arg(&config)
        .arg("--test")
        .arg("../../test-sets/writing/task-1.toml")
        .arg("--responses")
        .arg("../../test-sets/answers/writing-task-1.json")
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("6.5"));

    let saved = std::fs::read_to_string(dir.path().join("writing-task-1-grading.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved[0]["overall_band"], 6.5);
}

#[test]
fn band_conversion() {
    quizmark()
        .args(["band", "--skill", "listening", "--correct", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30/40 -> band 7.0 (good)"));

    quizmark()
        .args(["band", "--skill", "reading", "--correct", "13", "--total", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scaled 26/40"))
        .stdout(predicate::str::contains("band 6.0"));
}

#[test]
fn band_table_listing() {
    quizmark()
        .args(["band", "--skill", "reading"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reading band table"))
        .stdout(predicate::str::contains("39+"));
}

#[test]
fn band_rejects_writing() {
    quizmark()
        .args(["band", "--skill", "writing", "--correct", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("external grader"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizmark.toml"))
        .stdout(predicate::str::contains("Created test-sets/example.toml"));

    assert!(dir.path().join("quizmark.toml").exists());
    assert!(dir.path().join("test-sets/example-answers.json").exists());

    quizmark()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--test-set")
        .arg("test-sets/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All tests valid"));

    quizmark()
        .current_dir(dir.path())
        .arg("score")
        .arg("--test")
        .arg("test-sets/example.toml")
        .arg("--answers")
        .arg("test-sets/example-answers.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 5/5 (100.0%) band 9.0"));

    assert_eq!(
        reports_in(&dir.path().join("quizmark-results"), "json").len(),
        1
    );
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // Second init should skip
    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn compare_nonexistent_report() {
    quizmark()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    quizmark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question markup parser and answer scorer"));
}

#[test]
fn version_output() {
    quizmark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizmark"));
}
