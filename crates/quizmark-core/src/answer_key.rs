//! Instructor answer keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::{canonical_id, compare_ids};

/// Separator authors use to list alternative answers in a single field.
pub const ALTERNATIVE_SEPARATOR: char = '/';

/// The accepted value(s) for one key entry.
///
/// For a scalar submission `Any` lists interchangeable alternatives; for a
/// multi-select submission it is the required set of selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AcceptedAnswer {
    One(String),
    Any(Vec<String>),
}

impl AcceptedAnswer {
    /// Interpret an authored field: `"fish / fishes"` lists two alternatives.
    pub fn authored(raw: &str) -> Self {
        if !raw.contains(ALTERNATIVE_SEPARATOR) {
            return AcceptedAnswer::One(raw.trim().to_string());
        }
        let mut parts: Vec<String> = raw
            .split(ALTERNATIVE_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        if parts.len() == 1 {
            AcceptedAnswer::One(parts.remove(0))
        } else {
            AcceptedAnswer::Any(parts)
        }
    }

    /// Expand authored separators inside a `One`.
    fn normalized(self) -> Self {
        match self {
            AcceptedAnswer::One(raw) => AcceptedAnswer::authored(&raw),
            any => any,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            AcceptedAnswer::One(value) => vec![value.as_str()],
            AcceptedAnswer::Any(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, AcceptedAnswer::Any(_))
    }

    /// Human-readable form, alternatives joined with ` / `.
    pub fn display(&self) -> String {
        self.values().join(" / ")
    }
}

impl From<&str> for AcceptedAnswer {
    fn from(raw: &str) -> Self {
        AcceptedAnswer::authored(raw)
    }
}

impl From<Vec<&str>> for AcceptedAnswer {
    fn from(values: Vec<&str>) -> Self {
        AcceptedAnswer::Any(values.into_iter().map(String::from).collect())
    }
}

/// Mapping from question identifier to accepted answer. Identifiers are
/// canonicalized on construction, so `"Q7"` and `"7"` name the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, AcceptedAnswer>",
    into = "BTreeMap<String, AcceptedAnswer>"
)]
pub struct AnswerKey {
    entries: BTreeMap<String, AcceptedAnswer>,
}

impl From<BTreeMap<String, AcceptedAnswer>> for AnswerKey {
    fn from(map: BTreeMap<String, AcceptedAnswer>) -> Self {
        map.into_iter().collect()
    }
}

impl From<AnswerKey> for BTreeMap<String, AcceptedAnswer> {
    fn from(key: AnswerKey) -> Self {
        key.entries
    }
}

impl<K: AsRef<str>> FromIterator<(K, AcceptedAnswer)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (K, AcceptedAnswer)>>(iter: I) -> Self {
        let mut key = AnswerKey::default();
        for (id, accepted) in iter {
            key.insert(id.as_ref(), accepted);
        }
        key
    }
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key from per-section ordered answers (the listening form).
    /// Questions are numbered from 1 across sections; blank entries are
    /// skipped but still consume a number.
    pub fn from_section_arrays<S: AsRef<str>>(sections: &[Vec<S>]) -> Self {
        let mut key = AnswerKey::default();
        let answers = sections.iter().flat_map(|section| section.iter());
        for (index, raw) in answers.enumerate() {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            key.insert(&(index + 1).to_string(), AcceptedAnswer::authored(raw));
        }
        key
    }

    pub fn insert(&mut self, id: &str, accepted: AcceptedAnswer) {
        self.entries.insert(canonical_id(id), accepted.normalized());
    }

    pub fn get(&self, id: &str) -> Option<&AcceptedAnswer> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in numeric question order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AcceptedAnswer)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(id, accepted)| (id.as_str(), accepted))
            .collect();
        entries.sort_by(|a, b| compare_ids(a.0, b.0));
        entries.into_iter()
    }

    /// Identifiers in numeric question order.
    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Every single-question identifier the key covers, with group keys
    /// such as `"11,12"` expanded.
    pub fn question_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .keys()
            .flat_map(|id| id.split(','))
            .map(String::from)
            .collect();
        ids.sort_by(|a, b| compare_ids(a, b));
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authored_alternatives_split_on_slash() {
        assert_eq!(
            AcceptedAnswer::authored("fish / fishes"),
            AcceptedAnswer::Any(vec!["fish".into(), "fishes".into()])
        );
        assert_eq!(
            AcceptedAnswer::authored("  library "),
            AcceptedAnswer::One("library".into())
        );
        assert_eq!(AcceptedAnswer::authored("dog/"), AcceptedAnswer::One("dog".into()));
    }

    #[test]
    fn ids_are_canonical_and_numeric_ordered() {
        let key: AnswerKey = vec![
            ("Q10", AcceptedAnswer::from("B")),
            ("9", AcceptedAnswer::from("A")),
            ("2", AcceptedAnswer::from("C")),
        ]
        .into_iter()
        .collect();
        assert_eq!(key.ids(), vec!["2", "9", "10"]);
        assert!(key.contains("10"));
    }

    #[test]
    fn section_arrays_number_sequentially() {
        let sections = vec![vec!["fish", "", "blue"], vec!["Tuesday / Tue"]];
        let key = AnswerKey::from_section_arrays(&sections);
        assert_eq!(key.ids(), vec!["1", "3", "4"]);
        assert!(key.get("4").is_some_and(AcceptedAnswer::is_list));
    }

    #[test]
    fn deserializes_mixed_shapes_from_toml() {
        let toml = r#"
"1" = "fish / fishes"
"11,12" = ["A", "C"]
"Q3" = "TRUE"
"#;
        let key: AnswerKey = toml::from_str(toml).unwrap();
        assert_eq!(key.len(), 3);
        assert_eq!(
            key.get("1"),
            Some(&AcceptedAnswer::Any(vec!["fish".into(), "fishes".into()]))
        );
        assert_eq!(key.get("11,12"), Some(&AcceptedAnswer::from(vec!["A", "C"])));
        assert_eq!(key.get("3"), Some(&AcceptedAnswer::One("TRUE".into())));
        assert_eq!(key.question_ids(), vec!["1", "3", "11", "12"]);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut key = AnswerKey::new();
        key.insert("5", AcceptedAnswer::from("park"));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"5":"park"}"#);
    }
}
