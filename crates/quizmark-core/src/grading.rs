//! Contract with external essay and speech graders.
//!
//! Writing and speaking responses are not scored by a band table. The
//! engine prepares plain-text requests, hands them to a [`ResponseGrader`]
//! and treats whatever comes back as display data, apart from picking out
//! an overall band when one is present.

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::GradingError;
use crate::markup::to_plain_text;
use crate::model::Skill;

/// Plain text of authored markup, for graders that expect prose.
pub fn strip_markup(html: &str) -> String {
    to_plain_text(html)
}

/// One response to be graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingRequest {
    pub skill: Skill,
    /// The task as shown to the candidate, as plain text.
    pub task_prompt: String,
    /// An exemplar answer that shows the grader what the task expects.
    #[serde(default)]
    pub sample_answer: Option<String>,
    /// The candidate's essay, or the formatted speaking transcript.
    pub response: String,
}

impl GradingRequest {
    /// A writing request built from the task's authored markup.
    pub fn writing(task_markup: &str, sample_answer: Option<&str>, essay: &str) -> Self {
        Self {
            skill: Skill::Writing,
            task_prompt: strip_markup(task_markup),
            sample_answer: sample_answer.map(strip_markup),
            response: essay.trim().to_string(),
        }
    }

    /// A speaking request from examiner questions and candidate answers.
    pub fn speaking(task_markup: &str, turns: &[(String, String)]) -> Self {
        let response = turns
            .iter()
            .enumerate()
            .map(|(i, (question, answer))| {
                let answer = if answer.trim().is_empty() {
                    "(No answer provided)"
                } else {
                    answer.trim()
                };
                format!(
                    "Question {n}: {question}\nCandidate's Answer {n}: {answer}",
                    n = i + 1
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            skill: Skill::Speaking,
            task_prompt: strip_markup(task_markup),
            sample_answer: None,
            response,
        }
    }

    pub fn validate(&self) -> Result<(), GradingError> {
        if self.task_prompt.trim().is_empty() {
            return Err(GradingError::InvalidRequest("task prompt is empty".into()));
        }
        if self.response.trim().is_empty() {
            return Err(GradingError::InvalidRequest("response is empty".into()));
        }
        Ok(())
    }
}

/// Feedback returned by a grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingFeedback {
    /// Overall band, when the grader reported one.
    pub overall_band: Option<f64>,
    /// The grader's full structured output.
    pub body: serde_json::Value,
}

impl GradingFeedback {
    pub fn from_value(body: serde_json::Value) -> Self {
        let overall_band = body
            .pointer("/scores/overall")
            .or_else(|| body.get("overallBandScore"))
            .and_then(serde_json::Value::as_f64);
        Self { overall_band, body }
    }
}

/// Trait for external graders of essays and speaking transcripts.
#[async_trait]
pub trait ResponseGrader: Send + Sync {
    /// Human-readable grader name.
    fn name(&self) -> &str;

    /// Grade one response.
    async fn grade(&self, request: &GradingRequest) -> anyhow::Result<GradingFeedback>;
}

/// Parse raw grader output: code fences are removed and the rest must be JSON.
pub fn parse_grader_output(text: &str) -> Result<GradingFeedback, GradingError> {
    let cleaned = strip_fences(text);
    let body: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| GradingError::MalformedOutput(e.to_string()))?;
    Ok(GradingFeedback::from_value(body))
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Grade many requests with at most `parallelism` in flight. Results come
/// back in request order; a failed request does not stop the others.
pub async fn grade_all(
    grader: &dyn ResponseGrader,
    requests: &[GradingRequest],
    parallelism: usize,
) -> Vec<anyhow::Result<GradingFeedback>> {
    let semaphore = Semaphore::new(parallelism.max(1));
    let mut futures = FuturesUnordered::new();

    for (index, request) in requests.iter().enumerate() {
        let semaphore = &semaphore;
        futures.push(async move { (index, grade_one(grader, semaphore, request).await) });
    }

    let mut results: Vec<Option<anyhow::Result<GradingFeedback>>> =
        requests.iter().map(|_| None).collect();
    while let Some((index, result)) = futures.next().await {
        if let Err(e) = &result {
            tracing::error!("grading request {index} failed with {}: {e:#}", grader.name());
        }
        results[index] = Some(result);
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| Err(anyhow::anyhow!("grading request was not run"))))
        .collect()
}

async fn grade_one(
    grader: &dyn ResponseGrader,
    semaphore: &Semaphore,
    request: &GradingRequest,
) -> anyhow::Result<GradingFeedback> {
    request.validate()?;
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
    grader.grade(request).await
}
