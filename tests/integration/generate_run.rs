//! Blocking entry points: topics, plan and a full generate run against a fake backend.

use qmaker::error::ApiError;
use qmaker::generation::{
    run_generate, run_plan, run_topics, GenerateRequest, SessionState, TopicInput,
};
use qmaker::types::QuestionType;
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::test_utils::{fast_driver, topics, FakeBackend};

#[test]
fn generate_run_reports_every_snapshot_and_the_plan() {
    let backend = Arc::new(FakeBackend::new(topics(&[50.0, 30.0, 20.0])));
    let mut driver = fast_driver(3);
    driver.question_type = QuestionType::Msq;
    driver.part_id = Some("part-a".to_string());
    let request = GenerateRequest {
        topics: TopicInput::Course("physics-101".to_string()),
        total_questions: 10,
        driver,
        interactive: false,
    };

    let mut seen = Vec::new();
    let outcome = run_generate(backend.clone(), &request, |snapshot| {
        seen.push(snapshot.clone())
    })
    .unwrap();

    assert_eq!(outcome.plan.counts(), vec![5, 3, 2]);
    assert_eq!(outcome.summary.state, SessionState::Completed);
    assert_eq!(outcome.summary.generated, 10);
    assert_eq!(outcome.summary.percentage, 100);

    let last = seen.last().unwrap();
    assert_eq!(last.state, SessionState::Completed);
    assert!(seen.windows(2).all(|w| w[0].generated <= w[1].generated));

    let requests = backend.requests.lock();
    assert_eq!(requests.len(), 10);
    assert!(requests
        .iter()
        .all(|r| r.question_type == QuestionType::Msq && r.part_id.as_deref() == Some("part-a")));
    // Topics are filled in plan order.
    assert_eq!(requests[0].topic_id.as_str(), "t1");
    assert_eq!(requests[9].topic_id.as_str(), "t3");
}

#[test]
fn unknown_course_fails_before_generation() {
    let backend = Arc::new(FakeBackend::new(Vec::new()));
    let request = GenerateRequest {
        topics: TopicInput::Course("unknown".to_string()),
        total_questions: 10,
        driver: fast_driver(1),
        interactive: false,
    };
    let err = run_generate(backend.clone(), &request, |_| {}).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(backend.requests.lock().is_empty());
}

#[test]
fn topics_file_feeds_plan_without_the_backend() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("topics.toml");
    std::fs::write(
        &path,
        r#"
[[topics]]
id = "mech"
name = "Mechanics"
weightage = 70
chapter_name = "Dynamics"

[[topics]]
id = "therm"
name = "Thermodynamics"
weightage = 30
"#,
    )
    .unwrap();

    let backend = FakeBackend::new(Vec::new());
    let input = TopicInput::File(path);
    let listed = run_topics(&backend, &input).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].label(), "Dynamics › Mechanics");

    let plan = run_plan(&backend, &input, 20).unwrap();
    assert_eq!(plan.counts(), vec![14, 6]);
    assert!(plan.exact_sum);
}
