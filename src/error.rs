//! Error types for question planning and generation sessions.

use crate::generation::session::SessionState;
use crate::types::TopicId;
use std::time::Duration;
use thiserror::Error;

/// Input rejected by the distribution planner before any generation begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("Topic {topic_id} has negative weightage {weightage}")]
    NegativeWeightage { topic_id: TopicId, weightage: f64 },

    #[error("Topic {topic_id} has a non-finite weightage")]
    NonFiniteWeightage { topic_id: TopicId },

    #[error("Topic {0} appears more than once in the topic list")]
    DuplicateTopic(TopicId),
}

/// Rejected session control requests. Never leaves counters changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Cannot {action} a session that is {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    #[error("Session {0} has already finished")]
    Closed(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid plan input: {0}")]
    Plan(#[from] PlanError),

    #[error("Session control error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Backend request failed: {0}")]
    RequestFailed(String),

    #[error("Backend authentication failed: {0}")]
    AuthFailed(String),

    #[error("Backend rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Backend resource not found: {0}")]
    NotFound(String),

    #[error("Backend returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Generated question rejected: {0}")]
    InvalidQuestion(String),

    #[error("Generation call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Errors a generation slot may retry. Configuration and input errors are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ApiError::Plan(_) | ApiError::Session(_) | ApiError::ConfigError(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
