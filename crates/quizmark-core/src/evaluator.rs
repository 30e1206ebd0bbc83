//! Answer evaluation.
//!
//! Pure and deterministic: the same store and key always produce the same
//! [`ScoreResult`]. Malformed entries score as incorrect instead of failing.

use std::collections::HashMap;

use crate::answer_key::{AcceptedAnswer, AnswerKey};
use crate::answers::{Answer, AnswerStore};
use crate::band::{band_score, BandTier};
use crate::model::Skill;
use crate::results::{QuestionOutcome, ScoreResult};

/// Trimmed, lower-cased form used for comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalized_set(values: &[impl AsRef<str>]) -> Vec<String> {
    let mut set: Vec<String> = values.iter().map(|v| normalize(v.as_ref())).collect();
    set.sort();
    set
}

/// Whether `submitted` satisfies `accepted`.
///
/// A scalar matches when it equals one accepted alternative; a selection
/// matches a list when both hold the same values in any order. Shape
/// mismatches and blank submissions are incorrect.
pub fn is_correct(submitted: Option<&Answer>, accepted: &AcceptedAnswer) -> bool {
    let Some(submitted) = submitted else {
        return false;
    };
    if submitted.is_blank() {
        return false;
    }
    match (submitted, accepted) {
        (Answer::Text(text), AcceptedAnswer::One(expected)) => normalize(text) == normalize(expected),
        (Answer::Text(text), AcceptedAnswer::Any(alternatives)) => {
            let text = normalize(text);
            alternatives.iter().any(|alt| normalize(alt) == text)
        }
        (Answer::Choices(choices), AcceptedAnswer::Any(expected)) => {
            choices.len() == expected.len() && normalized_set(choices) == normalized_set(expected)
        }
        (Answer::Choices(_), AcceptedAnswer::One(_)) => false,
    }
}

/// Score `store` against `key`. The key decides which questions count.
pub fn evaluate(store: &AnswerStore, key: &AnswerKey, skill: Skill) -> ScoreResult {
    let mut group_claims: HashMap<&str, HashMap<String, Claim>> = HashMap::new();
    let mut per_question = Vec::with_capacity(key.len());

    for (id, accepted) in key.iter() {
        let (submitted, correct) = if let Some(answer) = store.get(id) {
            // A multi-question key expects a selection, never a single value.
            let correct = match answer {
                Answer::Text(_) if is_group_id(id) => false,
                _ => is_correct(Some(answer), accepted),
            };
            (Some(answer.clone()), correct)
        } else if let Some((group_key, Answer::Choices(selected))) = store.group_for(id) {
            let claims = group_claims
                .entry(group_key)
                .or_insert_with(|| claim_group(group_key, selected, key));
            match claims.get(id) {
                Some(claim) => (claim.value.clone().map(Answer::Text), claim.correct),
                None => (None, false),
            }
        } else {
            (None, false)
        };
        per_question.push(QuestionOutcome {
            question_id: id.to_string(),
            submitted,
            accepted: accepted.clone(),
            correct,
        });
    }

    let correct_count = per_question.iter().filter(|q| q.correct).count();
    let total_questions = per_question.len();
    let percentage = if total_questions == 0 {
        0.0
    } else {
        correct_count as f64 / total_questions as f64 * 100.0
    };
    let band = band_score(skill, correct_count, total_questions).ok();
    tracing::debug!(%skill, correct_count, total_questions, ?band, "evaluated attempt");

    ScoreResult {
        skill,
        per_question,
        correct_count,
        total_questions,
        percentage,
        band,
        band_tier: band.map(BandTier::from_band),
    }
}

fn is_group_id(id: &str) -> bool {
    id.contains(',')
}

#[derive(Debug, Clone)]
struct Claim {
    value: Option<String>,
    correct: bool,
}

/// Distribute a multi-question selection over the group's individually
/// keyed questions. Each question claims the first unclaimed selection that
/// it accepts; questions left without one see the leftover selections.
fn claim_group(group_key: &str, selected: &[String], key: &AnswerKey) -> HashMap<String, Claim> {
    let mut ids: Vec<&str> = group_key.split(',').collect();
    ids.sort_by(|a, b| crate::identity::compare_ids(a, b));

    let mut taken = vec![false; selected.len()];
    let mut claims = HashMap::new();
    let mut unclaimed = Vec::new();

    for id in ids {
        let Some(accepted) = key.get(id) else { continue };
        let found = selected.iter().enumerate().position(|(i, value)| {
            !taken[i] && is_correct(Some(&Answer::Text(value.clone())), accepted)
        });
        match found {
            Some(i) => {
                taken[i] = true;
                claims.insert(
                    id.to_string(),
                    Claim {
                        value: Some(selected[i].clone()),
                        correct: true,
                    },
                );
            }
            None => unclaimed.push(id),
        }
    }

    let mut leftovers = selected
        .iter()
        .zip(&taken)
        .filter(|(_, taken)| !**taken)
        .map(|(value, _)| value.clone());
    for id in unclaimed {
        claims.insert(
            id.to_string(),
            Claim {
                value: leftovers.next(),
                correct: false,
            },
        );
    }
    claims
}
