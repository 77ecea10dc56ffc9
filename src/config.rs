//! Configuration System
//!
//! Layered configuration for the backend client, generation sessions, the exam
//! marking scheme and logging. Sources merge in order: built-in defaults, the global
//! config file, workspace config files, then `QMAKER__SECTION__KEY` environment
//! variables.

use crate::error::ApiError;
use crate::generation::{Backoff, DriverConfig, RetryPolicy};
use crate::logging::LoggingConfig;
use crate::types::{GenerationMode, QuestionType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QMakerConfig {
    /// Question backend
    #[serde(default)]
    pub api: ApiConfig,

    /// Generation session settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Marking scheme of the paper being generated
    #[serde(default)]
    pub exam: ExamConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sent as a bearer token when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// `GET {base_url}/api/{topics_path}/{course_id}`
    #[serde(default = "default_topics_path")]
    pub topics_path: String,

    /// `POST {base_url}/api/{question_path}`
    #[serde(default = "default_question_path")]
    pub question_path: String,

    /// `POST {base_url}/api/{solution_path}`
    #[serde(default = "default_solution_path")]
    pub solution_path: String,
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_topics_path() -> String {
    "all-topics-with-weightage".to_string()
}

fn default_question_path() -> String {
    "generate-question".to_string()
}

fn default_solution_path() -> String {
    "generate-solution".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            topics_path: default_topics_path(),
            question_path: default_question_path(),
            solution_path: default_solution_path(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), String> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(format!(
                "base_url '{}' must start with http:// or https://",
                self.base_url
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        for (name, path) in [
            ("topics_path", &self.topics_path),
            ("question_path", &self.question_path),
            ("solution_path", &self.solution_path),
        ] {
            if path.trim_matches('/').is_empty() {
                return Err(format!("{} cannot be empty", name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_total_questions")]
    pub total_questions: u32,

    /// Attempts per slot, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_backoff")]
    pub backoff: Backoff,

    /// Pause after each successful call.
    #[serde(default = "default_success_delay_ms")]
    pub success_delay_ms: u64,

    /// Per-call timeout; zero disables it.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    #[serde(default = "default_question_type")]
    pub question_type: QuestionType,

    #[serde(default = "default_mode")]
    pub mode: GenerationMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
}

fn default_total_questions() -> u32 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    2000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff() -> Backoff {
    Backoff::Linear
}

fn default_success_delay_ms() -> u64 {
    1000
}

fn default_call_timeout_secs() -> u64 {
    120
}

fn default_question_type() -> QuestionType {
    QuestionType::Mcq
}

fn default_mode() -> GenerationMode {
    GenerationMode::NewQuestions
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            total_questions: default_total_questions(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            backoff: default_backoff(),
            success_delay_ms: default_success_delay_ms(),
            call_timeout_secs: default_call_timeout_secs(),
            question_type: default_question_type(),
            mode: default_mode(),
            part_id: None,
            slot_id: None,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(format!(
                "retry_max_delay_ms ({}) is below retry_base_delay_ms ({})",
                self.retry_max_delay_ms, self.retry_base_delay_ms
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            backoff: self.backoff,
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            retry: self.retry_policy(),
            success_delay: Duration::from_millis(self.success_delay_ms),
            call_timeout: (self.call_timeout_secs > 0)
                .then(|| Duration::from_secs(self.call_timeout_secs)),
            question_type: self.question_type,
            mode: self.mode,
            part_id: self.part_id.clone(),
            slot_id: self.slot_id.clone(),
        }
    }
}

/// Marking scheme used to describe the generated paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamConfig {
    #[serde(default = "default_correct_marks")]
    pub correct_marks: f64,

    /// Usually negative.
    #[serde(default = "default_incorrect_marks")]
    pub incorrect_marks: f64,

    #[serde(default)]
    pub skipped_marks: f64,

    #[serde(default = "default_minutes_per_question")]
    pub minutes_per_question: f64,
}

fn default_correct_marks() -> f64 {
    4.0
}

fn default_incorrect_marks() -> f64 {
    -1.0
}

fn default_minutes_per_question() -> f64 {
    3.0
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            correct_marks: default_correct_marks(),
            incorrect_marks: default_incorrect_marks(),
            skipped_marks: 0.0,
            minutes_per_question: default_minutes_per_question(),
        }
    }
}

impl ExamConfig {
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            self.correct_marks,
            self.incorrect_marks,
            self.skipped_marks,
            self.minutes_per_question,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err("marks and minutes must be finite numbers".to_string());
        }
        if self.correct_marks <= 0.0 {
            return Err("correct_marks must be positive".to_string());
        }
        if self.incorrect_marks > self.correct_marks || self.skipped_marks > self.correct_marks {
            return Err("incorrect_marks and skipped_marks cannot exceed correct_marks".to_string());
        }
        if self.minutes_per_question <= 0.0 {
            return Err("minutes_per_question must be positive".to_string());
        }
        Ok(())
    }

    pub fn max_marks(&self, questions: u32) -> f64 {
        self.correct_marks * questions as f64
    }

    /// Whole minutes, rounded up.
    pub fn duration_minutes(&self, questions: u32) -> u32 {
        (self.minutes_per_question * questions as f64).ceil() as u32
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Api(String),
    Generation(String),
    Exam(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Api(msg) => write!(f, "api: {}", msg),
            ValidationError::Generation(msg) => write!(f, "generation: {}", msg),
            ValidationError::Exam(msg) => write!(f, "exam: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl QMakerConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.api.validate() {
            errors.push(ValidationError::Api(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.exam.validate() {
            errors.push(ValidationError::Exam(e));
        }
        if let Err(e) = crate::logging::validate_format(&self.logging.format) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = crate::logging::validate_output(&self.logging.output) {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into a single [`ApiError`].
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
