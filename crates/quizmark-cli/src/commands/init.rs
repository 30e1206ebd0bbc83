//! The `quizmark init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_once(Path::new("quizmark.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("test-sets")?;
    write_once(Path::new("test-sets/example.toml"), EXAMPLE_TEST)?;
    write_once(Path::new("test-sets/example-answers.json"), EXAMPLE_ANSWERS)?;

    println!("\nNext steps:");
    println!("  1. Run: quizmark validate --test-set test-sets/example.toml");
    println!("  2. Run: quizmark score --test test-sets/example.toml --answers test-sets/example-answers.json");
    println!("  3. Author your own tests under test-sets/");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizmark configuration

output_dir = "./quizmark-results"
# Fail when a question block is never closed instead of warning
strict_blocks = false
# Report formats written by `quizmark score`: json, html, all
default_format = "json"
grading_parallelism = 4

# External grader for writing and speaking tests. It receives one request
# as JSON on stdin and prints feedback JSON on stdout.
# [grader]
# command = "${HOME}/bin/essay-grader"
# args = []
# timeout_secs = 120
"#;

const EXAMPLE_TEST: &str = r#"[test]
id = "example"
title = "Example Listening Test"
skill = "listening"

[[sections]]
title = "Part 1"
content = """
<h3>Questions 1-3</h3>
<p>Complete the notes. Write ONE WORD for each answer.</p>
<p>Name of hotel: Q1 {}</p>
<p>Room type: Q2 {} room</p>
<p>-( Q3 When will the guest arrive?</p>
<p>@A Monday</p>
<p>@B Tuesday</p>
<p>@C Friday -)</p>
"""
answers = ["Seaview / Sea View", "double", "B"]

[[sections]]
title = "Part 2"
content = """
<h3>Questions 4-5</h3>
<p>-[ Q4-5 Which TWO facilities does the hotel offer?</p>
<p>@A a gym</p>
<p>@B a pool</p>
<p>@C a spa</p>
<p>@D a cinema -]</p>
"""

# Each question of a "choose TWO" block is keyed on its own; the two
# selections may be given in either order.
[answers]
"4" = "A"
"5" = "C"
"#;

const EXAMPLE_ANSWERS: &str = r#"{
  "1": "seaview",
  "2": "Double",
  "3": "B",
  "4,5": ["C", "A"]
}
"#;
