//! The `quizmark validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizmark_core::model::ParseOptions;
use quizmark_core::parser::validate_test;

pub fn execute(test_set: PathBuf, options: ParseOptions, deny_warnings: bool) -> Result<()> {
    let tests = super::load_tests(&test_set)?;
    anyhow::ensure!(!tests.is_empty(), "no tests found in {}", test_set.display());

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for test in &tests {
        println!(
            "Test: {} [{}] ({} sections, {} keyed questions)",
            test.title,
            test.skill,
            test.sections.len(),
            test.answer_key.len()
        );

        if let Err(e) = test.documents_with(options) {
            println!("  ERROR: {e}");
            total_errors += 1;
        }

        let warnings = validate_test(test);
        for w in &warnings {
            let mut prefix = String::from(" ");
            if let Some(section) = &w.section {
                prefix.push_str(&format!(" [{section}]"));
            }
            if let Some(id) = &w.question_id {
                prefix.push_str(&format!(" [Q{id}]"));
            }
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 && total_errors == 0 {
        println!("All tests valid.");
    } else {
        println!("\n{total_errors} error(s), {total_warnings} warning(s) found.");
    }

    if total_errors > 0 {
        anyhow::bail!("{total_errors} test(s) failed strict parsing");
    }
    if deny_warnings && total_warnings > 0 {
        anyhow::bail!("{total_warnings} warning(s) with --deny-warnings");
    }

    Ok(())
}
