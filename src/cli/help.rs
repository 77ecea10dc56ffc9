//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands, TopicArgs};
use crate::generation::TopicInput;
use std::path::PathBuf;

/// Command name string for logs (e.g. "plan", "config.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Topics { .. } => "topics".to_string(),
        Commands::Plan { .. } => "plan".to_string(),
        Commands::Generate { .. } => "generate".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show { .. } => "show",
        ConfigCommands::Validate => "validate",
    }
}

/// Topic source named by the flags; file paths are relative to the workspace.
pub fn topic_input(source: &TopicArgs, workspace_root: &std::path::Path) -> TopicInput {
    match (&source.course, &source.topics_file) {
        (Some(course), _) => TopicInput::Course(course.clone()),
        (None, Some(path)) if path.is_absolute() => TopicInput::File(path.clone()),
        (None, Some(path)) => TopicInput::File(workspace_root.join(path)),
        (None, None) => TopicInput::File(PathBuf::from("topics.json")),
    }
}
