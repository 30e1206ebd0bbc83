//! Marker body parsing.
//!
//! Turns the raw body of a delimited block into a stem and options
//! (choice blocks) or into per-question statements (judgment and matching
//! blocks).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::identity::first_question_id;
use crate::markup::{self, decode_entities, find_all, parse_fragment, strip_tags, tag_spans};
use crate::model::ChoiceOption;

/// The option delimiter of the flat authoring convention.
pub const DELIMITER: char = '@';

static EMPTY_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*<p(?:\s[^>]*)?>(?:\s|&nbsp;|&#160;)*</p>\s*")
        .expect("empty paragraph regex is invalid")
});

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr", "col", "source"];

static LIST_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:ol|ul|li)[\s>]").expect("list start regex is invalid"));

static OPTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z])").expect("option label regex is invalid"));

static QUESTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Q\d+").expect("question start regex is invalid"));

static LEADING_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Q\d+\s*").expect("leading question regex is invalid"));

/// Which authoring convention a choice body was parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyConvention {
    /// `stem @A option @B option`
    Delimited,
    /// A stem followed by an `<ol>`/`<ul>` whose items are the options.
    List,
    /// Neither convention matched; split on the delimiter anyway.
    Fallback,
}

/// A parsed choice block body.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceBody {
    pub stem_markup: String,
    pub options: Vec<ChoiceOption>,
    pub convention: BodyConvention,
}

/// Remove editor artifacts: non-breaking-space entities and empty paragraphs.
pub fn clean_body(raw: &str) -> String {
    let without_empty = EMPTY_PARAGRAPH.replace_all(raw, "");
    without_empty.replace("&nbsp;", " ").replace('\u{a0}', " ")
}

/// Drop tags left unmatched by splitting markup on the delimiter: close tags
/// with no opener in the segment and open tags that are never closed.
pub fn trim_dangling_tags(segment: &str) -> String {
    let tags = tag_spans(segment);
    let mut dangling = vec![false; tags.len()];
    let mut open: Vec<(usize, &str)> = Vec::new();

    for (i, tag) in tags.iter().enumerate() {
        let self_closing = tag.self_closing || VOID_TAGS.contains(&tag.name.as_str());
        if !tag.is_end {
            if !self_closing {
                open.push((i, tag.name.as_str()));
            }
        } else if let Some(at) = open.iter().rposition(|(_, n)| *n == tag.name) {
            open.truncate(at);
        } else {
            dangling[i] = true;
        }
    }
    for (i, _) in open {
        dangling[i] = true;
    }

    let mut out = String::with_capacity(segment.len());
    let mut last = 0;
    for (tag, drop) in tags.iter().zip(dangling) {
        if drop {
            out.push_str(&segment[last..tag.start]);
            last = tag.end;
        }
    }
    out.push_str(&segment[last..]);
    out.trim().to_string()
}

/// Plain text of a markup segment.
pub fn segment_text(segment: &str) -> String {
    decode_entities(&strip_tags(segment))
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Answer value of an option: its first letter upper-cased, or the trimmed
/// option text when it does not start with a letter.
pub fn option_value(display_markup: &str) -> String {
    let text = segment_text(display_markup);
    match OPTION_LABEL.captures(&text).and_then(|c| c.get(1)) {
        Some(letter) => letter.as_str().to_ascii_uppercase(),
        None => text,
    }
}

/// Letter label for the option at `index`: A, B, ... Z, then AA, AB, ...
pub fn letter_for(index: usize) -> String {
    let mut n = index;
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

/// Parse a cleaned choice body. Never fails: malformed bodies degrade to a
/// delimiter split, possibly with no options.
pub fn parse_choice_body(body: &str) -> ChoiceBody {
    if body.contains(DELIMITER) {
        return delimited(body, BodyConvention::Delimited);
    }
    if let Some(start) = LIST_START.find(body) {
        let nodes = parse_fragment(body);
        let items = find_all(&nodes, "li");
        if !items.is_empty() {
            let options = items
                .iter()
                .enumerate()
                .map(|(i, li)| ChoiceOption {
                    display_markup: li.inner.trim().to_string(),
                    value: letter_for(i),
                })
                .collect();
            return ChoiceBody {
                stem_markup: trim_dangling_tags(&body[..start.start()]),
                options,
                convention: BodyConvention::List,
            };
        }
    }
    delimited(body, BodyConvention::Fallback)
}

fn delimited(body: &str, convention: BodyConvention) -> ChoiceBody {
    let mut parts = split_segments(body).into_iter();
    let stem_markup = parts.next().unwrap_or_default();
    let options = parts
        .map(|display_markup| ChoiceOption {
            value: option_value(&display_markup),
            display_markup,
        })
        .collect();
    ChoiceBody {
        stem_markup,
        options,
        convention,
    }
}

/// Split on the delimiter, keeping only segments with visible text.
fn split_segments(body: &str) -> Vec<String> {
    body.split(DELIMITER)
        .filter(|part| !segment_text(part).is_empty())
        .map(trim_dangling_tags)
        .collect()
}

/// One statement of a judgment block.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub question_id: Option<String>,
    pub markup: String,
}

/// Split a judgment body into its `@`-delimited statements.
pub fn split_statements(body: &str) -> Vec<Statement> {
    split_segments(&clean_body(body))
        .into_iter()
        .map(|markup| Statement {
            question_id: first_question_id(&segment_text(&markup)),
            markup,
        })
        .collect()
}

/// One prompt of a matching block.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingPrompt {
    pub question_id: Option<String>,
    /// Prompt text with the placeholder and leading question number removed.
    pub prompt: String,
}

/// Split a matching body. Tags are stripped; prompts are `@`-delimited, or
/// split before each `Q<n>` when no delimiter separates them.
pub fn split_matching(body: &str) -> Vec<MatchingPrompt> {
    let text = decode_entities(&strip_tags(body)).replace('\u{a0}', " ");
    let mut parts: Vec<&str> = text
        .split(DELIMITER)
        .filter(|p| !p.trim().is_empty())
        .collect();
    if parts.len() == 1 {
        let starts: Vec<usize> = QUESTION_START.find_iter(&text).map(|m| m.start()).collect();
        if starts.len() > 1 {
            let mut split = Vec::with_capacity(starts.len() + 1);
            let head = &text[..starts[0]];
            if !head.trim().is_empty() {
                split.push(head);
            }
            for (i, &start) in starts.iter().enumerate() {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                split.push(&text[start..end]);
            }
            parts = split;
        }
    }
    parts
        .into_iter()
        .map(|part| {
            let cleaned = part.replace("{}", "");
            let cleaned = cleaned.trim();
            MatchingPrompt {
                question_id: first_question_id(cleaned),
                prompt: LEADING_QUESTION.replace(cleaned, "").trim().to_string(),
            }
        })
        .collect()
}

/// Escape matching prompt text for use as markup.
pub fn prompt_markup(prompt: &str) -> String {
    markup::escape(prompt)
}
