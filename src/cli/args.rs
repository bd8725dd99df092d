//! Command line argument parsing for the guidebot CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Guidebot - an intent-routing chatbot
#[derive(Parser, Debug, Clone)]
#[command(name = "guidebot")]
#[command(about = "Classify user messages into intents and reply with canned responses")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct GuidebotArgs {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the model artifacts
    #[arg(long, env = "GUIDEBOT_MODEL_DIR", value_name = "DIR", global = true)]
    pub model_dir: Option<PathBuf>,

    /// Intent catalog file (JSON); the built-in catalog is used otherwise
    #[arg(long, env = "GUIDEBOT_CATALOG", value_name = "CATALOG_FILE", global = true)]
    pub catalog: Option<PathBuf>,

    /// Seed for response selection
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl GuidebotArgs {
    /// Get the effective verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug).
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Log level implied by the verbosity flags.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity() {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Retrain from the catalog, replacing any stored model
    Train(TrainArgs),

    /// Classify a message and show per-intent scores
    Classify(ClassifyArgs),

    /// Reply to a single message
    Reply(ReplyArgs),

    /// Interactive chat on stdin/stdout
    Chat,

    /// Answer JSON inference requests, one per line on stdin
    Serve,

    /// Show the stored model
    Inspect,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Regularization strength (inverse)
    #[arg(long)]
    pub c: Option<f64>,

    /// Maximum Newton iterations per label
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Relative gradient tolerance
    #[arg(long)]
    pub tolerance: Option<f64>,
}

/// Arguments for classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Message to classify
    #[arg(value_name = "MESSAGE")]
    pub message: String,
}

/// Arguments for a single reply
#[derive(Parser, Debug, Clone)]
pub struct ReplyArgs {
    /// Message to reply to
    #[arg(value_name = "MESSAGE")]
    pub message: String,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_command() {
        let args =
            GuidebotArgs::try_parse_from(["guidebot", "classify", "Hello there"]).unwrap();

        if let Command::Classify(classify_args) = args.command {
            assert_eq!(classify_args.message, "Hello there");
        } else {
            panic!("Expected classify command");
        }
        assert_eq!(args.output_format, OutputFormat::Human);
    }

    #[test]
    fn test_train_command() {
        let args = GuidebotArgs::try_parse_from([
            "guidebot",
            "train",
            "--c",
            "2.5",
            "--max-iterations",
            "50",
        ])
        .unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.c, Some(2.5));
            assert_eq!(train_args.max_iterations, Some(50));
            assert_eq!(train_args.tolerance, None);
        } else {
            panic!("Expected train command");
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = GuidebotArgs::try_parse_from([
            "guidebot",
            "reply",
            "Bye",
            "--format",
            "json",
            "--seed",
            "7",
            "--model-dir",
            "/tmp/model",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.model_dir, Some(PathBuf::from("/tmp/model")));
    }

    #[test]
    fn test_verbosity() {
        let args = GuidebotArgs::try_parse_from(["guidebot", "inspect"]).unwrap();
        assert_eq!(args.verbosity(), 1);
        assert_eq!(args.log_level(), LevelFilter::Warn);

        let args = GuidebotArgs::try_parse_from(["guidebot", "-vv", "inspect"]).unwrap();
        assert_eq!(args.log_level(), LevelFilter::Debug);

        let args = GuidebotArgs::try_parse_from(["guidebot", "-v", "-q", "serve"]).unwrap();
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.log_level(), LevelFilter::Error);
    }

    #[test]
    fn test_missing_message_is_rejected() {
        assert!(GuidebotArgs::try_parse_from(["guidebot", "classify"]).is_err());
    }
}
