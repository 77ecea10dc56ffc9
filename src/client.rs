//! HTTP client for the question backend: topic listing and one-question generation.
//!
//! The backend owns prompting and AI-response parsing; this client only moves JSON
//! records and maps transport failures into [`ApiError`].

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::generation::{QuestionGenerator, TopicSource};
use crate::types::{GeneratedQuestion, GenerationMode, SlotRequest, Topic};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

fn map_http_error(error: reqwest::Error) -> ApiError {
    if let Some(status) = error.status() {
        map_status(status, &error.to_string())
    } else if error.is_timeout() {
        ApiError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::RequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::RequestFailed(format!("HTTP error: {}", error))
    }
}

fn map_status(status: StatusCode, detail: &str) -> ApiError {
    match status.as_u16() {
        401 | 403 => ApiError::AuthFailed(format!("Authentication failed: {}", detail)),
        429 => ApiError::RateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => ApiError::NotFound(detail.to_string()),
        _ => ApiError::RequestFailed(format!("Request failed with status {}: {}", status, detail)),
    }
}

pub struct HttpQuestionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    topics_path: String,
    question_path: String,
    solution_path: String,
}

impl HttpQuestionClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::ConfigError(
                "api.base_url is required to reach the question backend".to_string(),
            ));
        }
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            topics_path: config.topics_path.clone(),
            question_path: config.question_path.clone(),
            solution_path: config.solution_path.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_matches('/'))
    }

    pub fn topics_url(&self, course_id: &str) -> String {
        format!("{}/{}", self.endpoint(&self.topics_path), course_id)
    }

    pub fn generate_url(&self, mode: GenerationMode) -> String {
        match mode {
            GenerationMode::NewQuestions => self.endpoint(&self.question_path),
            GenerationMode::PyqSolutions => self.endpoint(&self.solution_path),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, &error_text));
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl TopicSource for HttpQuestionClient {
    async fn list_topics_with_weightage(&self, course_id: &str) -> Result<Vec<Topic>, ApiError> {
        let url = self.topics_url(course_id);
        debug!(url = %url, "Fetching topics");
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(map_http_error)?;
        Self::decode(response).await
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionClient {
    async fn generate_one(&self, request: &SlotRequest) -> Result<GeneratedQuestion, ApiError> {
        let url = self.generate_url(request.mode);
        debug!(
            url = %url,
            topic_id = %request.topic_id,
            question_type = %request.question_type,
            "Requesting question"
        );
        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(map_http_error)?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn urls_follow_configured_paths() {
        let client = HttpQuestionClient::from_config(&config("http://backend:8001/")).unwrap();
        assert_eq!(
            client.topics_url("course-7"),
            "http://backend:8001/api/all-topics-with-weightage/course-7"
        );
        assert_eq!(
            client.generate_url(GenerationMode::NewQuestions),
            "http://backend:8001/api/generate-question"
        );
        assert_eq!(
            client.generate_url(GenerationMode::PyqSolutions),
            "http://backend:8001/api/generate-solution"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = HttpQuestionClient::from_config(&config("  ")).err().unwrap();
        assert!(matches!(err, ApiError::ConfigError(_)));
    }

    #[test]
    fn statuses_map_to_error_kinds() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "bad key"),
            ApiError::AuthFailed(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "quota"),
            ApiError::RateLimit(_)
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "Topic not found"),
            ApiError::NotFound(_)
        ));
        let err = map_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, ApiError::RequestFailed(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_api_key_is_ignored() {
        let mut cfg = config("http://localhost:8001");
        cfg.api_key = Some(String::new());
        let client = HttpQuestionClient::from_config(&cfg).unwrap();
        assert!(client.api_key.is_none());
    }
}
