//! Question identity resolution.
//!
//! Stems reference their question numbers as `Q7`, `Q11-12`, `Q11–Q13` or
//! `Q3, Q7`. A dash is an inclusive range; a comma lists exactly two numbers.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static QUESTION_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Q(\d+)(?:\s*([-–,])\s*Q?(\d+))?").expect("question number regex is invalid")
});

static FIRST_QUESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Q(\d+)").expect("question regex is invalid"));

/// Ranges wider than this are treated as a single number; no real section
/// spans more questions than a full test.
const MAX_RANGE: u32 = 40;

/// Resolve every question number referenced by the first `Q<n>` reference
/// in `stem`. Returns an empty list when the stem has no reference.
pub fn resolve_question_ids(stem: &str) -> Vec<String> {
    let Some(caps) = QUESTION_NUMBERS.captures(stem) else {
        return Vec::new();
    };
    let Some(first) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
        return Vec::new();
    };
    let second = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
    let separator = caps.get(2).map(|m| m.as_str());

    match (separator, second) {
        (Some(","), Some(second)) if second != first => {
            vec![first.to_string(), second.to_string()]
        }
        (Some(_), Some(second)) => {
            let (lo, hi) = if first <= second {
                (first, second)
            } else {
                (second, first)
            };
            if hi - lo >= MAX_RANGE {
                tracing::warn!(lo, hi, "question range too wide, keeping first number");
                return vec![first.to_string()];
            }
            (lo..=hi).map(|n| n.to_string()).collect()
        }
        _ => vec![first.to_string()],
    }
}

/// The first question number in `text`, if any.
pub fn first_question_id(text: &str) -> Option<String> {
    FIRST_QUESTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_number(m.as_str()))
}

fn normalize_number(digits: &str) -> String {
    digits
        .parse::<u32>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| digits.to_string())
}

/// Numeric ordering for question identifiers: by leading integer (so `"10"`
/// sorts after `"9"` and `"11,12"` sorts as 11), then lexically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn leading_number(id: &str) -> Option<u64> {
    let digits: String = id
        .trim()
        .trim_start_matches(['Q', 'q'])
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Canonical form of an identifier written by authors or UIs: `"Q7"`,
/// `" 07 "` and `"7"` all become `"7"`. Group keys keep their commas.
pub fn canonical_id(raw: &str) -> String {
    raw.split(',')
        .map(|part| {
            let part = part.trim().trim_start_matches(['Q', 'q']).trim();
            normalize_number(part)
        })
        .collect::<Vec<_>>()
        .join(",")
}
