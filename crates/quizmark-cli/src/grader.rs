//! Grader that shells out to an external program.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use quizmark_core::error::GradingError;
use quizmark_core::grading::{parse_grader_output, GradingFeedback, GradingRequest, ResponseGrader};

use crate::config::GraderConfig;

/// Runs a configured command once per request: the request goes to stdin
/// as JSON and the feedback is read from stdout.
pub struct CommandGrader {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGrader {
    pub fn new(config: &GraderConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }
}

#[async_trait]
impl ResponseGrader for CommandGrader {
    fn name(&self) -> &str {
        &self.command
    }

    async fn grade(&self, request: &GradingRequest) -> Result<GradingFeedback> {
        let input = serde_json::to_vec(request).context("failed to serialize grading request")?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GradingError::Unavailable(format!("{}: {e}", self.command)))?;

        // Writing the request counts against the timeout: a grader that
        // never reads stdin blocks the write once the pipe is full.
        let stdin = child.stdin.take();
        let exchange = async move {
            if let Some(mut stdin) = stdin {
                stdin
                    .write_all(&input)
                    .await
                    .context("failed to send request to grader")?;
            }
            let output = child
                .wait_with_output()
                .await
                .context("failed to wait for grader")?;
            Ok::<_, anyhow::Error>(output)
        };

        let output = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                GradingError::Unavailable(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GradingError::Unavailable(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            ))
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_grader_output(&stdout)?)
    }
}
