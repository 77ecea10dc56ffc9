//! Driver sessions through the public handle: pacing, failure accounting, events and
//! pause / resume / stop control.

use qmaker::error::SessionError;
use qmaker::generation::{GenerationDriver, SessionState};
use qmaker::telemetry::{ProgressBus, ProgressEvent, SessionEndedData, SlotEventData};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::integration::test_utils::{fast_driver, planned, topics, FakeBackend};

fn drain(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn types(events: &[ProgressEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event_type.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn failing_topic_is_skipped_and_reported() {
    let backend = Arc::new(FakeBackend::new(topics(&[60.0, 40.0])).failing_on("t2"));
    let bus = ProgressBus::new();
    let mut rx = bus.subscribe();
    let driver = GenerationDriver::new(fast_driver(2)).with_progress(bus);

    let handle = driver.start(&planned(&[60.0, 40.0], 5), backend.clone()).unwrap();
    let summary = handle.join().await.unwrap();

    assert_eq!(summary.state, SessionState::Completed);
    assert_eq!(summary.generated, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.retries, 2);
    assert_eq!(summary.percentage, 60);
    assert_eq!(summary.question_ids.len(), 3);
    assert!(summary.failures.iter().all(|f| f.topic_id == "t2" && f.attempts == 2));
    assert_eq!(backend.calls_for("t1"), 3);
    assert_eq!(backend.calls_for("t2"), 4);

    let events = drain(&mut rx);
    let kinds = types(&events);
    assert_eq!(kinds.first(), Some(&"session_started"));
    assert_eq!(kinds.last(), Some(&"session_completed"));
    assert_eq!(kinds.iter().filter(|k| **k == "slot_failed").count(), 2);

    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "sequence numbers increase");

    let failed: SlotEventData = events
        .iter()
        .find(|e| e.event_type == "slot_failed")
        .and_then(|e| e.data_as())
        .unwrap();
    assert_eq!(failed.topic_id, "t2");
    assert_eq!(failed.error.as_deref(), Some("Backend request failed: model overloaded"));

    let ended: SessionEndedData = events.last().and_then(|e| e.data_as()).unwrap();
    assert_eq!(ended.status, "completed");
    assert_eq!(ended.generated, 3);
}

#[tokio::test(start_paused = true)]
async fn success_delay_paces_calls() {
    let backend = Arc::new(FakeBackend::new(topics(&[100.0])));
    let mut config = fast_driver(1);
    config.success_delay = Duration::from_secs(2);
    let started = tokio::time::Instant::now();

    let handle = GenerationDriver::new(config)
        .start(&planned(&[100.0], 3), backend.clone())
        .unwrap();
    let summary = handle.join().await.unwrap();

    assert_eq!(summary.generated, 3);
    assert!(started.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn pause_resume_and_stop_from_a_controller() {
    let backend = Arc::new(FakeBackend::new(topics(&[50.0, 50.0])));
    let mut config = fast_driver(1);
    config.success_delay = Duration::from_secs(5);
    let handle = GenerationDriver::new(config)
        .start(&planned(&[50.0, 50.0], 6), backend.clone())
        .unwrap();
    let controller = handle.controller();

    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| s.generated >= 2).await.unwrap();

    controller.pause().unwrap();
    let paused = controller.wait_for_state(SessionState::Paused).await;
    let calls_at_pause = backend.requests.lock().len();
    assert_eq!(paused.generated as usize, calls_at_pause);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.requests.lock().len(), calls_at_pause);
    assert!(matches!(
        controller.pause(),
        Err(SessionError::InvalidTransition { .. })
    ));

    controller.resume().unwrap();
    snapshots
        .wait_for(|s| s.generated as usize > calls_at_pause)
        .await
        .unwrap();

    controller.stop().unwrap();
    let summary = handle.join().await.unwrap();
    assert_eq!(summary.state, SessionState::Stopped);
    assert_eq!(summary.generated, 0);
    assert_eq!(summary.failed, 0);
    assert!(matches!(controller.resume(), Err(SessionError::Closed(_))));
}

#[tokio::test(start_paused = true)]
async fn stop_while_paused_ends_the_session() {
    let backend = Arc::new(FakeBackend::new(topics(&[100.0])));
    let handle = GenerationDriver::new(fast_driver(1))
        .start(&planned(&[100.0], 4), backend.clone())
        .unwrap();

    handle.pause().unwrap();
    handle.wait_for_state(SessionState::Paused).await;
    handle.stop().unwrap();

    let summary = handle.join().await.unwrap();
    assert_eq!(summary.state, SessionState::Stopped);
    assert!(backend.requests.lock().is_empty());
}
