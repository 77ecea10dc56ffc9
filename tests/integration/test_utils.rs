//! Shared fixtures: topic lists, a scripted generator and question records.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use qmaker::error::ApiError;
use qmaker::generation::{
    AllocationPlan, Backoff, DriverConfig, QuestionGenerator, RetryPolicy, TopicSource,
};
use qmaker::types::{GeneratedQuestion, SlotRequest, Topic};
use std::collections::HashSet;
use std::time::Duration;

pub fn topics(weights: &[f64]) -> Vec<Topic> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| Topic::new(format!("t{}", i + 1), format!("Topic {}", i + 1), *w))
        .collect()
}

pub fn question(request: &SlotRequest, id: String) -> GeneratedQuestion {
    GeneratedQuestion {
        id,
        topic_id: request.topic_id.clone(),
        topic_name: request.topic_name.clone(),
        question_statement: format!("Question about {}", request.topic_name),
        question_type: request.question_type,
        options: Some(vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ]),
        answer: "2".to_string(),
        solution: "Worked solution.".to_string(),
        difficulty_level: "Medium".to_string(),
        part_id: request.part_id.clone(),
        slot_id: request.slot_id.clone(),
        created_at: Utc::now(),
    }
}

/// Fast driver settings: no pacing, 1 ms linear retry delay.
pub fn fast_driver(max_attempts: u32) -> DriverConfig {
    DriverConfig {
        retry: RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff: Backoff::Linear,
        },
        success_delay: Duration::ZERO,
        call_timeout: None,
        ..DriverConfig::default()
    }
}

/// Generator that always fails for the listed topic ids and succeeds elsewhere.
/// Also serves a fixed topic list, standing in for the HTTP backend.
pub struct FakeBackend {
    pub topics: Vec<Topic>,
    failing_topics: HashSet<String>,
    pub requests: Mutex<Vec<SlotRequest>>,
}

impl FakeBackend {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self {
            topics,
            failing_topics: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, topic_id: &str) -> Self {
        self.failing_topics.insert(topic_id.to_string());
        self
    }

    pub fn calls_for(&self, topic_id: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.topic_id.as_str() == topic_id)
            .count()
    }
}

#[async_trait]
impl QuestionGenerator for FakeBackend {
    async fn generate_one(&self, request: &SlotRequest) -> Result<GeneratedQuestion, ApiError> {
        let n = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };
        if self.failing_topics.contains(request.topic_id.as_str()) {
            return Err(ApiError::RequestFailed("model overloaded".to_string()));
        }
        Ok(question(request, format!("q{}", n)))
    }
}

#[async_trait]
impl TopicSource for FakeBackend {
    async fn list_topics_with_weightage(&self, course_id: &str) -> Result<Vec<Topic>, ApiError> {
        if course_id == "unknown" {
            return Err(ApiError::NotFound(format!("course {}", course_id)));
        }
        Ok(self.topics.clone())
    }
}

pub fn planned(weights: &[f64], total: u32) -> AllocationPlan {
    qmaker::generation::plan(&topics(weights), total).unwrap()
}
