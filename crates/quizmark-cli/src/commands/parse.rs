//! The `quizmark parse` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizmark_core::assembler::parse_document_with;
use quizmark_core::markup::strip_tags;
use quizmark_core::model::{ChoiceKind, Document, ParseOptions, RenderNode};

pub fn execute(input: PathBuf, options: ParseOptions, format: String) -> Result<()> {
    let html = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let document = parse_document_with(&html, options)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&document)?),
        "text" => print_summary(&document),
        other => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }

    Ok(())
}

fn print_summary(document: &Document) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Type", "Detail"]);

    for node in &document.nodes {
        add_rows(&mut table, node);
    }

    let question_count = document.question_ids().len();
    println!(
        "{question_count} question(s), {:?} blank numbering",
        document.numbering
    );
    if question_count > 0 {
        println!("{table}");
    }

    for warning in &document.warnings {
        println!("WARNING: {warning}");
    }
}

fn add_rows(table: &mut Table, node: &RenderNode) {
    match node {
        RenderNode::Passthrough { .. } => {}
        RenderNode::InlineBlank { question_id } => {
            table.add_row(vec![
                Cell::new(question_id),
                Cell::new("blank"),
                Cell::new(""),
            ]);
        }
        RenderNode::Choice {
            question_ids,
            options,
            kind,
            max_selections,
            ..
        } => {
            let kind = match kind {
                ChoiceKind::Single => "single choice".to_string(),
                ChoiceKind::Multiple => format!("choose {max_selections}"),
            };
            let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
            table.add_row(vec![
                Cell::new(question_ids.join(",")),
                Cell::new(kind),
                Cell::new(values.join(" ")),
            ]);
        }
        RenderNode::Judgment {
            question_id,
            categories,
            ..
        } => {
            table.add_row(vec![
                Cell::new(question_id),
                Cell::new("judgment"),
                Cell::new(categories.join(" / ")),
            ]);
        }
        RenderNode::Matching {
            question_id,
            prompt_markup,
        } => {
            table.add_row(vec![
                Cell::new(question_id),
                Cell::new("matching"),
                Cell::new(strip_tags(prompt_markup).trim()),
            ]);
        }
        RenderNode::Table { header, rows } => {
            for cell in header.iter().chain(rows.iter().flatten()) {
                for inner in &cell.nodes {
                    add_rows(table, inner);
                }
            }
        }
    }
}
