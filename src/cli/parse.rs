//! CLI parse: clap types for qmaker. No behavior; definitions only.

use crate::types::{GenerationMode, QuestionType};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// qmaker - weighted exam question planning and paced generation
#[derive(Parser)]
#[command(name = "qmaker")]
#[command(about = "Plan exam question quotas by topic weightage and drive AI question generation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Where topics come from: the backend or a local file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct TopicArgs {
    /// Course whose topics are fetched from the backend
    #[arg(long)]
    pub course: Option<String>,

    /// JSON or TOML file holding the topic list
    #[arg(long)]
    pub topics_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the topics of a course with their weightage
    Topics {
        #[command(flatten)]
        source: TopicArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show how many questions each topic would get
    Plan {
        #[command(flatten)]
        source: TopicArgs,
        /// Total questions (default: generation.total_questions)
        #[arg(long)]
        total: Option<u32>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Plan and generate questions topic by topic
    Generate {
        #[command(flatten)]
        source: TopicArgs,
        /// Total questions (default: generation.total_questions)
        #[arg(long)]
        total: Option<u32>,
        /// MCQ, MSQ, NAT or SUB (default: generation.question_type)
        #[arg(long)]
        question_type: Option<QuestionType>,
        /// new_questions or pyq_solutions (default: generation.mode)
        #[arg(long)]
        mode: Option<GenerationMode>,
        /// Attempts per question slot (default: generation.max_attempts)
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Read p / r / s from stdin to pause, resume or stop
        #[arg(long)]
        interactive: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Check the effective configuration and report every problem
    Validate,
}
