//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::{command_name, topic_input};
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_plan_json, format_plan_text, format_progress_line, format_summary_json,
    format_summary_text, format_topics_json, format_topics_text,
};
use crate::client::HttpQuestionClient;
use crate::config::{ConfigLoader, QMakerConfig};
use crate::error::ApiError;
use crate::generation::{run_generate, run_plan, run_topics, GenerateRequest, TopicInput};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, config path and the effective config.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: QMakerConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self {
            workspace_root,
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &QMakerConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = %name, "Executing command");
        let result = self.execute_inner(command);
        debug!(
            command = %name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Topics { source, format } => {
                let input = topic_input(source, &self.workspace_root);
                let topics = run_topics(&self.client()?, &input)?;
                if format == "json" {
                    format_topics_json(&topics)
                } else {
                    Ok(format_topics_text(course_of(&input), &topics))
                }
            }
            Commands::Plan {
                source,
                total,
                format,
            } => {
                let input = topic_input(source, &self.workspace_root);
                let total = total.unwrap_or(self.config.generation.total_questions);
                let plan = run_plan(&self.client()?, &input, total)?;
                if format == "json" {
                    format_plan_json(&plan, &self.config.exam)
                } else {
                    Ok(format_plan_text(&plan, &self.config.exam))
                }
            }
            Commands::Generate {
                source,
                total,
                question_type,
                mode,
                max_attempts,
                interactive,
                format,
            } => {
                let mut generation = self.config.generation.clone();
                if let Some(question_type) = question_type {
                    generation.question_type = *question_type;
                }
                if let Some(mode) = mode {
                    generation.mode = *mode;
                }
                if let Some(max_attempts) = max_attempts {
                    generation.max_attempts = *max_attempts;
                }
                generation.validate().map_err(ApiError::ConfigError)?;

                let request = GenerateRequest {
                    topics: topic_input(source, &self.workspace_root),
                    total_questions: total.unwrap_or(generation.total_questions),
                    driver: generation.driver_config(),
                    interactive: *interactive,
                };
                if *interactive {
                    eprintln!("Controls: p = pause, r = resume, s = stop");
                }

                let mut last_line = String::new();
                let outcome = run_generate(Arc::new(self.client()?), &request, |snapshot| {
                    let line = format_progress_line(snapshot);
                    if line != last_line {
                        eprintln!("{}", line);
                        last_line = line;
                    }
                })?;

                if format == "json" {
                    format_summary_json(&outcome.plan, &outcome.summary)
                } else {
                    Ok(format!(
                        "{}\n\n{}",
                        format_plan_text(&outcome.plan, &self.config.exam),
                        format_summary_text(&outcome.summary)
                    ))
                }
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show { format } => match format.as_str() {
                "json" => serde_json::to_string_pretty(&self.config).map_err(|e| {
                    ApiError::ConfigError(format!("Failed to render config: {}", e))
                }),
                "toml" => self.config.to_toml(),
                other => Err(ApiError::ConfigError(format!(
                    "Unknown config format '{}' (expected toml or json)",
                    other
                ))),
            },
            ConfigCommands::Validate => {
                self.config.ensure_valid()?;
                let source = match &self.config_path {
                    Some(path) => path.display().to_string(),
                    None => format!(
                        "workspace {} and environment",
                        self.workspace_root.display()
                    ),
                };
                Ok(format!("Configuration is valid ({}).", source))
            }
        }
    }

    fn client(&self) -> Result<HttpQuestionClient, ApiError> {
        self.config.api.validate().map_err(ApiError::ConfigError)?;
        HttpQuestionClient::from_config(&self.config.api)
    }
}

fn course_of(input: &TopicInput) -> Option<&str> {
    match input {
        TopicInput::Course(course) => Some(course),
        TopicInput::File(_) => None,
    }
}
