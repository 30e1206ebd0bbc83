//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use quizmark_core::markup::escape as html_escape;
use quizmark_core::report::ScoreReport;
use quizmark_core::results::{QuestionOutcome, ScoreResult};


/// Generate an HTML report from a score report.
pub fn generate_html(report: &ScoreReport) -> String {
    let result = &report.result;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>quizmark report: {}</title>\n",
        html_escape(&report.test.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.test.title)));
    html.push_str(&format!(
        "<p class=\"meta\">Test: <strong>{}</strong> | {} | {} questions | finished by {} | {}</p>\n",
        html_escape(&report.test.id),
        report.test.skill,
        result.total_questions,
        report.finish_reason,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&band_badge(result));
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Correct</th><th>Incorrect</th><th>Unanswered</th><th>Score</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr></tbody>\n",
        result.correct_count,
        result.total_questions - result.correct_count,
        result.unanswered_count(),
        result.percentage
    ));
    html.push_str("</table>\n");
    if result.total_questions > 0 {
        html.push_str(&generate_score_bar(result));
    }
    html.push_str("</section>\n");

    // Per-question outcomes
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    if result.per_question.is_empty() {
        html.push_str("<p class=\"meta\">No keyed questions in this attempt.</p>\n");
    } else {
        html.push_str("<table class=\"results-table\" id=\"results\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Your answer</th><th onclick=\"sortTable(2)\">Accepted</th><th onclick=\"sortTable(3)\">Result</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for outcome in &result.per_question {
            html.push_str(&outcome_row(outcome));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ScoreReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn band_badge(result: &ScoreResult) -> String {
    match (result.band, result.band_tier) {
        (Some(band), Some(tier)) => format!(
            "<p class=\"band\" style=\"background: {}\">Band {band:.1} <span>{tier}</span></p>\n",
            tier.color()
        ),
        (Some(band), None) => format!("<p class=\"band\">Band {band:.1}</p>\n"),
        _ => "<p class=\"meta\">No band: this skill is graded externally.</p>\n".to_string(),
    }
}

fn outcome_row(outcome: &QuestionOutcome) -> String {
    let submitted = outcome
        .submitted
        .as_ref()
        .filter(|a| !a.is_blank())
        .map(|a| html_escape(&a.display()))
        .unwrap_or_else(|| "<em>no answer</em>".to_string());
    let (class, text) = if outcome.correct {
        ("pass", "correct")
    } else {
        ("fail", "incorrect")
    };
    format!(
        "<tr class=\"{class}\"><td>{}</td><td>{submitted}</td><td>{}</td><td class=\"{class}\">{text}</td></tr>\n",
        html_escape(&outcome.question_id),
        html_escape(&outcome.accepted.display()),
    )
}

/// Horizontal stacked bar: correct, incorrect and unanswered shares.
fn generate_score_bar(result: &ScoreResult) -> String {
    let bar_height = 30;
    let max_width = 600usize;
    let total = result.total_questions.max(1) as f64;

    let unanswered = result.unanswered_count();
    let incorrect = result
        .total_questions
        .saturating_sub(result.correct_count + unanswered);
    let segments = [
        ("correct", result.correct_count, "#22c55e"),
        ("incorrect", incorrect, "#ef4444"),
        ("unanswered", unanswered, "#9ca3af"),
    ];

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        max_width,
        bar_height + 24
    );

    let mut x = 0usize;
    for (label, count, color) in segments {
        if count == 0 {
            continue;
        }
        let width = ((count as f64 / total) * max_width as f64).round() as usize;
        svg.push_str(&format!(
            "  <rect x=\"{x}\" y=\"0\" width=\"{width}\" height=\"{bar_height}\" fill=\"{color}\"><title>{label}: {count}</title></rect>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\">{label} {count}</text>\n",
            x + 4,
            bar_height + 16
        ));
        x += width;
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.band { display: inline-block; padding: 0.5rem 1rem; border-radius: 8px; color: #fff; font-size: 1.5rem; font-weight: bold; background: #6b7280; }
.band span { font-size: 0.9rem; font-weight: normal; margin-left: 0.5rem; text-transform: uppercase; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use quizmark_core::answer_key::AcceptedAnswer;
    use quizmark_core::answers::Answer;
    use quizmark_core::attempt::FinishReason;
    use quizmark_core::band::BandTier;
    use quizmark_core::model::Skill;
    use quizmark_core::report::TestSummary;

    fn make_test_report(skill: Skill, band: Option<f64>) -> ScoreReport {
        ScoreReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            test: TestSummary {
                id: "cambridge-18-1".into(),
                title: "Listening <Practice> 1".into(),
                skill,
                question_count: 3,
            },
            finish_reason: FinishReason::Timeout,
            result: ScoreResult {
                skill,
                per_question: vec![
                    QuestionOutcome {
                        question_id: "1".into(),
                        submitted: Some(Answer::Text("Fishes".into())),
                        accepted: AcceptedAnswer::from(vec!["fish", "fishes"]),
                        correct: true,
                    },
                    QuestionOutcome {
                        question_id: "2".into(),
                        submitted: Some(Answer::Text("<b>monday</b>".into())),
                        accepted: AcceptedAnswer::One("tuesday".into()),
                        correct: false,
                    },
                    QuestionOutcome {
                        question_id: "3".into(),
                        submitted: None,
                        accepted: AcceptedAnswer::One("c".into()),
                        correct: false,
                    },
                ],
                correct_count: 1,
                total_questions: 3,
                percentage: 100.0 / 3.0,
                band,
                band_tier: band.map(BandTier::from_band),
            },
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report(Skill::Listening, Some(6.5));
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("cambridge-18-1"));
        assert!(html.contains("Band 6.5"));
        assert!(html.contains(BandTier::Good.color()));
        assert!(html.contains("fish / fishes"));
        assert!(html.contains("finished by timeout"));
        assert!(html.contains("33.3%"));
    }

    #[test]
    fn user_text_is_escaped() {
        let html = generate_html(&make_test_report(Skill::Listening, Some(6.5)));
        assert!(html.contains("Listening &lt;Practice&gt; 1"));
        assert!(html.contains("&lt;b&gt;monday&lt;/b&gt;"));
        assert!(!html.contains("<b>monday</b>"));
    }

    #[test]
    fn unanswered_and_incorrect_rows_are_marked() {
        let html = generate_html(&make_test_report(Skill::Listening, Some(6.5)));
        assert!(html.contains("<em>no answer</em>"));
        assert_eq!(html.matches("<tr class=\"fail\">").count(), 2);
        assert_eq!(html.matches("<tr class=\"pass\">").count(), 1);
        assert!(html.contains("unanswered 1"));
    }

    #[test]
    fn externally_graded_report_has_no_band() {
        let html = generate_html(&make_test_report(Skill::Writing, None));
        assert!(html.contains("graded externally"));
        assert!(!html.contains("Band "));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report(Skill::Reading, Some(8.0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
        assert!(content.contains("excellent"));
    }
}
