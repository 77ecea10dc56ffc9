//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace individual keys, never whole sections, so a workspace file
/// that only sets `generation.total_questions` keeps every other default.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("api.base_url", "http://localhost:8001")?
        .set_default("api.topics_path", "all-topics-with-weightage")?
        .set_default("api.question_path", "generate-question")?
        .set_default("api.solution_path", "generate-solution")?
        .set_default("generation.total_questions", 30_i64)?
        .set_default("generation.max_attempts", 3_i64)?
        .set_default("generation.backoff", "linear")?
        .set_default("generation.question_type", "MCQ")?
        .set_default("generation.mode", "new_questions")?
        .set_default("logging.level", "info")
}
