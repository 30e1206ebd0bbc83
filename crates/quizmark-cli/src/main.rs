//! quizmark CLI: parse, validate and score marked-up exam content.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use quizmark_core::attempt::FinishReason;
use quizmark_core::model::{ParseOptions, Skill};

mod commands;
mod config;
mod grader;

#[derive(Parser)]
#[command(
    name = "quizmark",
    version,
    about = "Question markup parser and answer scorer"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an HTML fragment and show the questions found in it
    Parse {
        /// Path to the HTML file
        input: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Fail on blocks that are never closed
        #[arg(long)]
        strict: bool,
    },

    /// Validate test TOML files
    Validate {
        /// Path to test file or directory
        #[arg(long)]
        test_set: PathBuf,

        /// Fail on blocks that are never closed
        #[arg(long)]
        strict: bool,

        /// Exit code 1 if any warning is found
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Score an attempt against a test's answer key
    Score {
        /// Path to the test TOML file
        #[arg(long)]
        test: PathBuf,

        /// Answers JSON: an object keyed by question, an ordered array, or an event log
        #[arg(long)]
        answers: PathBuf,

        /// What ended the attempt: manual, timeout
        #[arg(long, default_value = "manual")]
        reason: FinishReason,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all, none
        #[arg(long)]
        format: Option<String>,

        /// Fail on blocks that are never closed
        #[arg(long)]
        strict: bool,
    },

    /// Grade writing or speaking responses with the configured grader
    Grade {
        /// Path to the test TOML file
        #[arg(long)]
        test: PathBuf,

        /// Responses JSON: one essay string or list of [question, answer] pairs per section
        #[arg(long)]
        responses: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Convert a correct count to a band, or print a skill's band table
    Band {
        /// Skill: listening, reading
        #[arg(long)]
        skill: Skill,

        /// Number of correct answers
        #[arg(long)]
        correct: Option<usize>,

        /// Number of questions (defaults to 40)
        #[arg(long)]
        total: Option<usize>,
    },

    /// Compare two score reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if any question went from correct to incorrect
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and example test
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "quizmark=info"
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            ),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init = cli.command {
        return commands::init::execute();
    }

    let config = config::load_config_from(cli.config.as_deref())?;
    let options = |strict: bool| {
        if strict {
            ParseOptions::strict()
        } else {
            config.parse_options()
        }
    };

    match cli.command {
        Commands::Parse {
            input,
            format,
            strict,
        } => commands::parse::execute(input, options(strict), format),
        Commands::Validate {
            test_set,
            strict,
            deny_warnings,
        } => commands::validate::execute(test_set, options(strict), deny_warnings),
        Commands::Score {
            test,
            answers,
            reason,
            output,
            format,
            strict,
        } => commands::score::execute(commands::score::ScoreArgs {
            test,
            answers,
            reason,
            output: output.unwrap_or_else(|| config.output_dir.clone()),
            format: format.unwrap_or_else(|| config.default_format.clone()),
            options: options(strict),
        }),
        Commands::Grade {
            test,
            responses,
            output,
        } => {
            let output = output.unwrap_or_else(|| config.output_dir.clone());
            commands::grade::execute(test, responses, output, &config).await
        }
        Commands::Band {
            skill,
            correct,
            total,
        } => commands::band::execute(skill, correct, total),
        Commands::Compare {
            baseline,
            current,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    }
}
