//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizmark_core::model::ParseOptions;

/// Top-level quizmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizmarkConfig {
    /// Where score reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Fail parsing when a block is never closed instead of warning.
    #[serde(default)]
    pub strict_blocks: bool,
    /// Report formats written by `score` when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Max grading requests in flight.
    #[serde(default = "default_grading_parallelism")]
    pub grading_parallelism: usize,
    /// External grader for writing and speaking tests.
    #[serde(default)]
    pub grader: Option<GraderConfig>,
}

/// An external grading program. It receives one request as JSON on stdin
/// and prints its feedback as JSON on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_grader_timeout")]
    pub timeout_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizmark-results")
}
fn default_format() -> String {
    "json".to_string()
}
fn default_grading_parallelism() -> usize {
    4
}
fn default_grader_timeout() -> u64 {
    120
}

impl Default for QuizmarkConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            strict_blocks: false,
            default_format: default_format(),
            grading_parallelism: default_grading_parallelism(),
            grader: None,
        }
    }
}

impl QuizmarkConfig {
    pub fn parse_options(&self) -> ParseOptions {
        if self.strict_blocks {
            ParseOptions::strict()
        } else {
            ParseOptions::default()
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `quizmark.toml` in the current directory
/// 2. `~/.config/quizmark/config.toml`
///
/// Environment variable overrides: `QUIZMARK_OUTPUT_DIR`, `QUIZMARK_STRICT`.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizmarkConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizmark.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizmarkConfig::default(),
    };

    if let Ok(dir) = std::env::var("QUIZMARK_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Ok(strict) = std::env::var("QUIZMARK_STRICT") {
        match parse_bool(&strict) {
            Some(value) => config.strict_blocks = value,
            None => tracing::warn!("ignoring QUIZMARK_STRICT={strict}: expected true or false"),
        }
    }

    Ok(config)
}

fn parse_config_str(content: &str) -> Result<QuizmarkConfig> {
    let mut config: QuizmarkConfig = toml::from_str(content)?;
    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    if let Some(grader) = &mut config.grader {
        grader.command = resolve_env_vars(&grader.command);
        grader.args = grader.args.iter().map(|a| resolve_env_vars(a)).collect();
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizmark"))
}
