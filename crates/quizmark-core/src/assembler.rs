//! Document assembly: drives the block scanner, the body parsers and the
//! identity resolver over an authored fragment and produces the ordered
//! render nodes of a [`Document`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{self, clean_body, parse_choice_body, segment_text};
use crate::error::ParseError;
use crate::identity::{canonical_id, resolve_question_ids};
use crate::markup::{parse_fragment, tag_spans, Node};
use crate::model::{
    BlankNumbering, BlockKind, Cell, ChoiceKind, Document, ParseOptions, ParseWarning,
    RenderNode, UnterminatedPolicy, WarningKind, TRUE_FALSE_NOT_GIVEN, YES_NO_NOT_GIVEN,
};
use crate::scanner::{split_blocks, RawBlock, Segment};

/// `Q7 {}` or a bare `{}`. Inline formatting tags may sit between the
/// number and the placeholder, as in `<strong>Q7</strong> {}`.
static BLANK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:Q(\d+)((?:\s|&nbsp;|</?(?i:strong|b|em|i|u|span|mark|sup|sub)\b[^<>]*>)*))?\{\}",
    )
    .expect("blank regex is invalid")
});

static NUMBERED_BLANK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Q\d+(?:\s|&nbsp;|</?(?i:strong|b|em|i|u|span|mark|sup|sub)\b[^<>]*>)*\{\}")
        .expect("numbered blank regex is invalid")
});

const PLACEHOLDER: &str = "{}";

/// Instruction text that switches judgment blocks to yes/no categories.
const YES_NO_INSTRUCTION: &str = "YES if the statement";

/// Parse a document with the default options. Unterminated blocks consume
/// the rest of the document and are reported as warnings.
pub fn parse_document(html: &str) -> Document {
    Assembler::new(html).run(html).0
}

/// Parse a document, failing on structural problems the options reject.
pub fn parse_document_with(html: &str, options: ParseOptions) -> Result<Document, ParseError> {
    let (document, unterminated) = Assembler::new(html).run(html);
    match (options.unterminated, unterminated) {
        (UnterminatedPolicy::Reject, Some((kind, opened_at))) => {
            Err(ParseError::UnterminatedBlock {
                kind,
                opened_at,
                close: kind.close(),
            })
        }
        _ => Ok(document),
    }
}

/// Blank numbering mode of a document: explicit as soon as one numbered
/// blank appears, sequential when only bare placeholders do.
pub fn detect_numbering(html: &str) -> BlankNumbering {
    if !NUMBERED_BLANK.is_match(html) && html.contains(PLACEHOLDER) {
        BlankNumbering::Sequential
    } else {
        BlankNumbering::Explicit
    }
}

/// Categories offered by judgment blocks in this document.
pub fn judgment_categories(html: &str) -> Vec<String> {
    let categories = if html.contains(YES_NO_INSTRUCTION) {
        YES_NO_NOT_GIVEN
    } else {
        TRUE_FALSE_NOT_GIVEN
    };
    categories.iter().map(|c| c.to_string()).collect()
}

struct Assembler {
    numbering: BlankNumbering,
    categories: Vec<String>,
    next_blank: u32,
    nodes: Vec<RenderNode>,
    warnings: Vec<ParseWarning>,
    unterminated: Option<(BlockKind, usize)>,
}

impl Assembler {
    fn new(html: &str) -> Self {
        Self {
            numbering: detect_numbering(html),
            categories: judgment_categories(html),
            next_blank: 0,
            nodes: Vec::new(),
            warnings: Vec::new(),
            unterminated: None,
        }
    }

    fn run(mut self, html: &str) -> (Document, Option<(BlockKind, usize)>) {
        for segment in split_blocks(parse_fragment(html)) {
            match segment {
                Segment::Content(node) => self.content(&node),
                Segment::Block(raw) => self.block(raw),
            }
        }
        self.check_duplicates();
        for warning in &self.warnings {
            tracing::warn!(kind = ?warning.kind, "{warning}");
        }
        let document = Document {
            nodes: self.nodes,
            warnings: self.warnings,
            numbering: self.numbering,
        };
        (document, self.unterminated)
    }

    fn emit(&mut self, node: RenderNode) {
        push_coalesced(&mut self.nodes, node);
    }

    fn emit_all(&mut self, nodes: Vec<RenderNode>) {
        for node in nodes {
            self.emit(node);
        }
    }

    fn content(&mut self, node: &Node) {
        let is_table = (node.is_tag("figure") && node.has_class("table")) || node.is_tag("table");
        if is_table && self.contains_blank(&node.outer) {
            self.table(node);
            return;
        }
        let nodes = self.blanks(&node.outer);
        self.emit_all(nodes);
    }

    fn contains_blank(&self, markup: &str) -> bool {
        match self.numbering {
            BlankNumbering::Explicit => NUMBERED_BLANK.is_match(markup),
            BlankNumbering::Sequential => markup.contains(PLACEHOLDER),
        }
    }

    /// Replace inline blanks in `markup` with blank nodes.
    fn blanks(&mut self, markup: &str) -> Vec<RenderNode> {
        let mut out = Vec::new();
        let mut last = 0;
        for caps in BLANK.captures_iter(markup) {
            let Some(whole) = caps.get(0) else { continue };
            let question_id = match (caps.get(1), self.numbering) {
                (Some(number), _) => canonical_id(number.as_str()),
                (None, BlankNumbering::Sequential) => {
                    self.next_blank += 1;
                    self.next_blank.to_string()
                }
                (None, BlankNumbering::Explicit) => {
                    self.warnings.push(ParseWarning::new(
                        WarningKind::UnnumberedBlank,
                        "blank has no question number and is left as text",
                        &surrounding(markup, whole.start(), whole.end()),
                    ));
                    continue;
                }
            };
            push_markup(&mut out, &markup[last..whole.start()]);
            out.push(RenderNode::InlineBlank { question_id });
            // Tags swallowed between number and placeholder are put back.
            if let Some(gap) = caps.get(2) {
                let gap = gap.as_str();
                let tags: String = tag_spans(gap)
                    .iter()
                    .map(|tag| &gap[tag.start..tag.end])
                    .collect();
                push_markup(&mut out, &tags);
            }
            last = whole.end();
        }
        push_markup(&mut out, &markup[last..]);
        out
    }

    /// A table with inline blanks. Inside a figure the table becomes a
    /// structured node and every other child passes through in order.
    fn table(&mut self, node: &Node) {
        if node.is_tag("table") {
            self.structured_table(node);
            return;
        }
        let mut rendered = false;
        for child in &node.children {
            let table = if child.is_tag("table") {
                Some(child)
            } else {
                child.find("table")
            };
            match table {
                Some(table) if !rendered => {
                    self.structured_table(table);
                    rendered = true;
                }
                _ => {
                    let nodes = self.blanks(&child.outer);
                    self.emit_all(nodes);
                }
            }
        }
    }

    fn structured_table(&mut self, table: &Node) {
        let mut header_cells: Vec<&Node> = Vec::new();
        let mut row_nodes: Vec<&Node> = Vec::new();
        let mut captions: Vec<&Node> = Vec::new();
        for child in &table.children {
            if child.is_tag("thead") {
                if let Some(first) = child.children.iter().find(|c| c.is_tag("tr")) {
                    header_cells = cells_of(first);
                }
            } else if child.is_tag("tbody") || child.is_tag("tfoot") {
                row_nodes.extend(child.children.iter().filter(|c| c.is_tag("tr")));
            } else if child.is_tag("tr") {
                row_nodes.push(child);
            } else if child.is_tag("caption") {
                captions.push(child);
            }
        }
        // Without a thead, a leading row of only `th` cells is the header.
        if header_cells.is_empty() {
            if let Some(first) = row_nodes.first() {
                let cells = cells_of(first);
                if !cells.is_empty() && cells.iter().all(|c| c.is_tag("th")) {
                    header_cells = cells;
                    row_nodes.remove(0);
                }
            }
        }

        let header = header_cells
            .iter()
            .map(|th| Cell {
                nodes: self.blanks(&th.inner),
            })
            .collect();
        let rows = row_nodes
            .iter()
            .map(|tr| {
                cells_of(tr)
                    .into_iter()
                    .map(|td| Cell {
                        nodes: self.blanks(&td.inner),
                    })
                    .collect()
            })
            .collect();

        tracing::debug!("parsed table with inline blanks");
        self.emit(RenderNode::Table { header, rows });
        for caption in captions {
            let nodes = self.blanks(&caption.outer);
            self.emit_all(nodes);
        }
    }

    fn block(&mut self, raw: RawBlock) {
        if !raw.terminated {
            self.warnings.push(ParseWarning::new(
                WarningKind::UnterminatedBlock,
                format!(
                    "{} block opened at node {} is never closed with `{}`",
                    raw.kind,
                    raw.opened_at,
                    raw.kind.close()
                ),
                &raw.body,
            ));
            self.unterminated.get_or_insert((raw.kind, raw.opened_at));
        }

        match raw.kind {
            BlockKind::MultiChoice => self.choice(&raw, ChoiceKind::Multiple),
            BlockKind::SingleChoice => self.choice(&raw, ChoiceKind::Single),
            BlockKind::Judgment => self.judgment(&raw),
            BlockKind::Matching => self.matching(&raw),
        }

        if !raw.trailing.trim().is_empty() {
            let nodes = self.blanks(&raw.trailing);
            self.emit_all(nodes);
        }
    }

    fn choice(&mut self, raw: &RawBlock, kind: ChoiceKind) {
        let body = clean_body(&raw.body);
        let parsed = parse_choice_body(&body);
        let mut question_ids = resolve_question_ids(&segment_text(&parsed.stem_markup));

        if question_ids.is_empty() {
            self.missing_number(raw.kind, &body);
            self.emit(RenderNode::Passthrough {
                markup: body.trim().to_string(),
            });
            return;
        }
        if parsed.options.is_empty() {
            self.warnings.push(ParseWarning::new(
                WarningKind::NoOptions,
                format!("{} block for Q{} has no options", raw.kind, question_ids[0]),
                &body,
            ));
        }
        if kind == ChoiceKind::Single {
            question_ids.truncate(1);
        }

        tracing::debug!(
            kind = %raw.kind,
            ids = ?question_ids,
            options = parsed.options.len(),
            convention = ?parsed.convention,
            "parsed choice block"
        );
        self.emit(RenderNode::Choice {
            max_selections: question_ids.len(),
            question_ids,
            stem_markup: parsed.stem_markup,
            options: parsed.options,
            kind,
        });
    }

    fn judgment(&mut self, raw: &RawBlock) {
        for statement in blocks::split_statements(&raw.body) {
            match statement.question_id {
                Some(question_id) => {
                    tracing::debug!(%question_id, "parsed judgment statement");
                    self.emit(RenderNode::Judgment {
                        question_id,
                        stem_markup: statement.markup,
                        categories: self.categories.clone(),
                    });
                }
                None => {
                    self.missing_number(raw.kind, &statement.markup);
                    self.emit(RenderNode::Passthrough {
                        markup: statement.markup,
                    });
                }
            }
        }
    }

    fn matching(&mut self, raw: &RawBlock) {
        let prompts = blocks::split_matching(&raw.body);
        let has_numbered = prompts.iter().any(|p| p.question_id.is_some());
        for (index, prompt) in prompts.into_iter().enumerate() {
            let prompt_markup = blocks::prompt_markup(&prompt.prompt);
            match prompt.question_id {
                Some(question_id) => {
                    tracing::debug!(%question_id, "parsed matching prompt");
                    self.emit(RenderNode::Matching {
                        question_id,
                        prompt_markup,
                    });
                }
                None => {
                    // A leading unnumbered segment is the block's instructions.
                    if !(index == 0 && has_numbered) {
                        self.missing_number(raw.kind, &prompt.prompt);
                    }
                    self.emit(RenderNode::Passthrough {
                        markup: prompt_markup,
                    });
                }
            }
        }
    }

    fn missing_number(&mut self, kind: BlockKind, context: &str) {
        self.warnings.push(ParseWarning::new(
            WarningKind::MissingQuestionNumber,
            format!("{kind} block has no question number and cannot be scored"),
            &segment_text(context),
        ));
    }

    fn check_duplicates(&mut self) {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for id in self.nodes.iter().flat_map(RenderNode::question_ids) {
            if !seen.insert(id) {
                duplicates.push(id.to_string());
            }
        }
        for id in duplicates {
            self.warnings.push(ParseWarning::new(
                WarningKind::DuplicateQuestion,
                format!("question {id} appears more than once"),
                "",
            ));
        }
    }
}

fn cells_of(row: &Node) -> Vec<&Node> {
    row.children
        .iter()
        .filter(|c| c.is_tag("td") || c.is_tag("th"))
        .collect()
}

fn push_markup(nodes: &mut Vec<RenderNode>, markup: &str) {
    if !markup.is_empty() {
        push_coalesced(
            nodes,
            RenderNode::Passthrough {
                markup: markup.to_string(),
            },
        );
    }
}

/// Append a node, merging adjacent pass-through markup.
fn push_coalesced(nodes: &mut Vec<RenderNode>, node: RenderNode) {
    if let RenderNode::Passthrough { markup } = &node {
        if markup.is_empty() {
            return;
        }
        if let Some(RenderNode::Passthrough { markup: previous }) = nodes.last_mut() {
            previous.push_str(markup);
            return;
        }
    }
    nodes.push(node);
}

fn surrounding(markup: &str, start: usize, end: usize) -> String {
    let from = markup[..start]
        .char_indices()
        .rev()
        .nth(20)
        .map_or(0, |(i, _)| i);
    let to = markup[end..]
        .char_indices()
        .nth(20)
        .map_or(markup.len(), |(i, _)| end + i);
    segment_text(&markup[from..to])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(doc: &Document) -> Vec<&str> {
        doc.question_ids()
    }

    #[test]
    fn marker_free_document_round_trips() {
        let html = "<h2>Part 1</h2>\n<p>Listen to the <em>recording</em>.</p><ul><li>one</li></ul>";
        let doc = parse_document(html);
        assert_eq!(
            doc.nodes,
            vec![RenderNode::Passthrough {
                markup: html.to_string()
            }]
        );
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn numbered_blank_binds_to_adjacent_number() {
        let doc = parse_document("<p>Name: Q7 {}</p>");
        assert_eq!(doc.numbering, BlankNumbering::Explicit);
        assert_eq!(
            doc.nodes,
            vec![
                RenderNode::Passthrough {
                    markup: "<p>Name: ".into()
                },
                RenderNode::InlineBlank {
                    question_id: "7".into()
                },
                RenderNode::Passthrough {
                    markup: "</p>".into()
                },
            ]
        );
    }

    #[test]
    fn bolded_number_binds_to_its_blank() {
        let doc = parse_document("<p>Name: <strong>Q7</strong> {}</p>");
        assert_eq!(doc.numbering, BlankNumbering::Explicit);
        assert_eq!(ids(&doc), vec!["7"]);
        assert_eq!(
            doc.nodes,
            vec![
                RenderNode::Passthrough {
                    markup: "<p>Name: <strong>".into()
                },
                RenderNode::InlineBlank {
                    question_id: "7".into()
                },
                RenderNode::Passthrough {
                    markup: "</strong></p>".into()
                },
            ]
        );
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn numbered_blank_with_nbsp_and_emphasis() {
        let doc = parse_document("<p>Cost: <b>Q3</b>&nbsp;<em>{}</em> dollars</p>");
        assert_eq!(ids(&doc), vec!["3"]);
        let markup: String = doc
            .nodes
            .iter()
            .filter_map(|n| match n {
                RenderNode::Passthrough { markup } => Some(markup.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(markup, "<p>Cost: <b></b><em></em> dollars</p>");
    }

    #[test]
    fn legacy_blanks_are_numbered_by_position() {
        let doc = parse_document("<p>Day: {}</p><p>Time: {} and {}</p>");
        assert_eq!(doc.numbering, BlankNumbering::Sequential);
        assert_eq!(ids(&doc), vec!["1", "2", "3"]);
    }

    #[test]
    fn bare_blank_in_explicit_document_is_text_with_warning() {
        let doc = parse_document("<p>Q1 {}</p><p>oops {}</p>");
        assert_eq!(ids(&doc), vec!["1"]);
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.warnings[0].kind, WarningKind::UnnumberedBlank);
        let text: String = doc
            .nodes
            .iter()
            .filter_map(|n| match n {
                RenderNode::Passthrough { markup } => Some(markup.as_str()),
                _ => None,
            })
            .collect();
        assert!(text.contains("oops {}"));
    }

    #[test]
    fn multi_choice_block_in_context() {
        let html = "<p>Intro</p><p>-[ Q11-12 Choose TWO letters</p><p>@A red</p><p>@B blue</p><p>@C green -]</p><p>Outro</p>";
        let doc = parse_document(html);
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(
            doc.nodes[0],
            RenderNode::Passthrough {
                markup: "<p>Intro</p>".into()
            }
        );
        match &doc.nodes[1] {
            RenderNode::Choice {
                question_ids,
                options,
                kind,
                max_selections,
                ..
            } => {
                assert_eq!(question_ids, &vec!["11".to_string(), "12".to_string()]);
                assert_eq!(*kind, ChoiceKind::Multiple);
                assert_eq!(*max_selections, 2);
                let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
                assert_eq!(values, vec!["A", "B", "C"]);
            }
            other => panic!("expected choice, got {other:?}"),
        }
        assert_eq!(doc.nodes[1].answer_key().as_deref(), Some("11,12"));
        assert_eq!(
            doc.nodes[2],
            RenderNode::Passthrough {
                markup: "<p>Outro</p>".into()
            }
        );
    }

    #[test]
    fn entity_range_expands_to_every_question() {
        let doc = parse_document("<p>-[ Q11&ndash;12 Choose TWO @A red @B blue @C green -]</p>");
        match &doc.nodes[0] {
            RenderNode::Choice {
                question_ids,
                max_selections,
                ..
            } => {
                assert_eq!(question_ids, &vec!["11".to_string(), "12".to_string()]);
                assert_eq!(*max_selections, 2);
            }
            other => panic!("expected choice, got {other:?}"),
        }
    }

    #[test]
    fn single_choice_allows_one_selection() {
        let doc = parse_document("<p>-( Q3 Where is the office? @A bank @B park -)</p>");
        match &doc.nodes[0] {
            RenderNode::Choice {
                question_ids,
                kind,
                max_selections,
                ..
            } => {
                assert_eq!(question_ids, &vec!["3".to_string()]);
                assert_eq!(*kind, ChoiceKind::Single);
                assert_eq!(*max_selections, 1);
            }
            other => panic!("expected choice, got {other:?}"),
        }
    }

    #[test]
    fn judgment_block_uses_yes_no_when_instructed() {
        let html = "<p>Write YES if the statement agrees with the views of the writer</p><p>-$ Q1 Cats sleep a lot. @Q2 Dogs dislike rain. -$</p>";
        let doc = parse_document(html);
        let judgments: Vec<_> = doc
            .nodes
            .iter()
            .filter_map(|n| match n {
                RenderNode::Judgment {
                    question_id,
                    categories,
                    ..
                } => Some((question_id.as_str(), categories.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(judgments.len(), 2);
        assert_eq!(judgments[0].0, "1");
        assert_eq!(judgments[1].0, "2");
        assert_eq!(judgments[0].1, vec!["YES", "NO", "NOT GIVEN"]);
    }

    #[test]
    fn judgment_defaults_to_true_false() {
        let doc = parse_document("<p>-$ Q5 The bridge is old. -$</p>");
        match &doc.nodes[0] {
            RenderNode::Judgment { categories, .. } => {
                assert_eq!(categories, &vec!["TRUE", "FALSE", "NOT GIVEN"]);
            }
            other => panic!("expected judgment, got {other:?}"),
        }
    }

    #[test]
    fn matching_block() {
        let doc = parse_document("<p>-% Choose a heading. Q14 {} Paragraph A Q15 {} Paragraph B -%</p>");
        assert_eq!(ids(&doc), vec!["14", "15"]);
        assert!(doc.warnings.is_empty());
        assert_eq!(
            doc.nodes[1],
            RenderNode::Matching {
                question_id: "14".into(),
                prompt_markup: "Paragraph A".into()
            }
        );
    }

    #[test]
    fn block_without_number_is_not_a_question() {
        let doc = parse_document("<p>-( Pick one @A yes @B no -)</p>");
        assert_eq!(doc.questions().count(), 0);
        assert_eq!(doc.warnings[0].kind, WarningKind::MissingQuestionNumber);
    }

    #[test]
    fn choice_without_options_warns() {
        let doc = parse_document("<p>-( Q9 nothing to pick -)</p>");
        assert_eq!(ids(&doc), vec!["9"]);
        assert_eq!(doc.warnings[0].kind, WarningKind::NoOptions);
    }

    #[test]
    fn unterminated_block_consumes_and_warns() {
        let html = "<p>-[ Q1-2 Choose TWO</p><p>@A x</p><p>@B y</p><p>Trailing section</p>";
        let doc = parse_document(html);
        assert_eq!(ids(&doc), vec!["1", "2"]);
        assert!(doc
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnterminatedBlock));
    }

    #[test]
    fn unterminated_block_rejected_in_strict_mode() {
        let err = parse_document_with("<p>-( Q1 open</p><p>@A x</p>", ParseOptions::strict())
            .unwrap_err();
        match err {
            ParseError::UnterminatedBlock {
                kind, opened_at, ..
            } => {
                assert_eq!(kind, BlockKind::SingleChoice);
                assert_eq!(opened_at, 0);
            }
        }
    }

    #[test]
    fn strict_mode_accepts_well_formed_documents() {
        let doc = parse_document_with("<p>-( Q1 x @A a @B b -)</p>", ParseOptions::strict()).unwrap();
        assert_eq!(ids(&doc), vec!["1"]);
    }

    #[test]
    fn list_items_are_scanned_for_blanks() {
        let doc = parse_document("<ul><li>-[ Q1 {}</li><li>Q2 {}</li></ul>");
        assert_eq!(ids(&doc), vec!["1", "2"]);
        assert!(doc
            .questions()
            .all(|n| matches!(n, RenderNode::InlineBlank { .. })));
    }

    #[test]
    fn figure_table_with_blanks_becomes_structured() {
        let html = "<figure class=\"table\"><table><thead><tr><th>Item</th><th>Cost</th></tr></thead>\
                    <tbody><tr><td>Room</td><td>Q1 {}</td></tr><tr><td>Q2 {}</td><td>$20</td></tr></tbody></table>\
                    <figcaption>Prices</figcaption></figure>";
        let doc = parse_document(html);
        match &doc.nodes[0] {
            RenderNode::Table { header, rows } => {
                assert_eq!(header.len(), 2);
                assert_eq!(rows.len(), 2);
                assert_eq!(
                    rows[0][1].nodes,
                    vec![RenderNode::InlineBlank {
                        question_id: "1".into()
                    }]
                );
            }
            other => panic!("expected table, got {other:?}"),
        }
        assert_eq!(ids(&doc), vec!["1", "2"]);
        assert_eq!(
            doc.nodes[1],
            RenderNode::Passthrough {
                markup: "<figcaption>Prices</figcaption>".into()
            }
        );
    }

    #[test]
    fn table_without_thead_keeps_header_row_and_figure_content() {
        let html = "<figure class=\"table\"><p>Complete the table.</p><table>\
                    <tr><th>Item</th><th>Cost</th></tr>\
                    <tr><td>Room</td><td>Q1 {}</td></tr></table>\
                    <figcaption>Prices</figcaption></figure>";
        let doc = parse_document(html);
        assert_eq!(
            doc.nodes[0],
            RenderNode::Passthrough {
                markup: "<p>Complete the table.</p>".into()
            }
        );
        match &doc.nodes[1] {
            RenderNode::Table { header, rows } => {
                assert_eq!(
                    header[0].nodes,
                    vec![RenderNode::Passthrough {
                        markup: "Item".into()
                    }]
                );
                assert_eq!(header.len(), 2);
                assert_eq!(rows.len(), 1);
                assert_eq!(
                    rows[0][1].nodes,
                    vec![RenderNode::InlineBlank {
                        question_id: "1".into()
                    }]
                );
            }
            other => panic!("expected table, got {other:?}"),
        }
        assert_eq!(
            doc.nodes[2],
            RenderNode::Passthrough {
                markup: "<figcaption>Prices</figcaption>".into()
            }
        );
    }

    #[test]
    fn table_without_blanks_passes_through() {
        let html = "<figure class=\"table\"><table><tr><td>a</td></tr></table></figure>";
        let doc = parse_document(html);
        assert_eq!(doc.nodes.len(), 1);
        assert!(matches!(doc.nodes[0], RenderNode::Passthrough { .. }));
    }

    #[test]
    fn duplicates_are_reported() {
        let doc = parse_document("<p>Q1 {}</p><p>Q1 {}</p>");
        assert!(doc
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::DuplicateQuestion));
    }

    #[test]
    fn trailing_text_after_close_is_kept() {
        let doc = parse_document("<p>-$ Q1 Rain is wet. -$ Next part</p>");
        assert_eq!(
            doc.nodes.last(),
            Some(&RenderNode::Passthrough {
                markup: " Next part".into()
            })
        );
    }
}
