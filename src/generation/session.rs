//! Generation session: lifecycle state, counters and cursor for one driver run.
//!
//! A session is owned by the driver loop and mutated only there. Everything outside
//! the loop sees it through [`ProgressSnapshot`] values.

use crate::error::SessionError;
use crate::generation::plan::{Allocation, AllocationPlan};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
            SessionState::Stopped => "stopped",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a session, published after every state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub session_id: String,
    pub state: SessionState,
    pub total_topics: usize,
    pub total_questions_planned: u32,
    pub target_total: u32,
    pub generated: u32,
    pub failed: u32,
    pub percentage: u32,
    pub current_topic_label: Option<String>,
    pub topic_index: usize,
    pub question_index: u32,
}

/// A slot that exhausted its attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotFailure {
    pub topic_id: String,
    pub topic_name: String,
    pub topic_index: usize,
    pub question_index: u32,
    pub attempts: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub state: SessionState,
    pub total_topics: usize,
    pub total_questions_planned: u32,
    pub target_total: u32,
    pub generated: u32,
    pub failed: u32,
    pub retries: u32,
    pub percentage: u32,
    pub failures: Vec<SlotFailure>,
    pub question_ids: Vec<String>,
}

/// Rounded share of `generated` in `target`, as a whole percentage.
pub fn percentage(generated: u32, target: u32) -> u32 {
    if target == 0 {
        return 0;
    }
    (generated as f64 / target as f64 * 100.0).round() as u32
}

#[derive(Debug)]
pub struct GenerationSession {
    session_id: String,
    allocations: Vec<Allocation>,
    target_total: u32,
    total_planned: u32,
    state: SessionState,
    generated: u32,
    failed: u32,
    retries: u32,
    topic_index: usize,
    question_index: u32,
    current_topic_label: Option<String>,
    failures: Vec<SlotFailure>,
    question_ids: Vec<String>,
}

impl GenerationSession {
    pub fn new(session_id: impl Into<String>, allocations: Vec<Allocation>, target_total: u32) -> Self {
        let total_planned = allocations.iter().map(|a| a.estimated_questions).sum();
        Self {
            session_id: session_id.into(),
            allocations,
            target_total,
            total_planned,
            state: SessionState::Idle,
            generated: 0,
            failed: 0,
            retries: 0,
            topic_index: 0,
            question_index: 0,
            current_topic_label: None,
            failures: Vec::new(),
            question_ids: Vec::new(),
        }
    }

    pub fn from_plan(session_id: impl Into<String>, plan: &AllocationPlan) -> Self {
        Self::new(session_id, plan.allocations.clone(), plan.total_requested)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn generated(&self) -> u32 {
        self.generated
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn target_reached(&self) -> bool {
        self.generated >= self.target_total
    }

    pub fn position(&self) -> (usize, u32) {
        (self.topic_index, self.question_index)
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Running, "start")?;
        self.generated = 0;
        self.failed = 0;
        self.retries = 0;
        self.topic_index = 0;
        self.question_index = 0;
        self.failures.clear();
        self.question_ids.clear();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Paused, "pause")
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Running, "resume")
    }

    /// Stopping discards progress: counters and cursor go back to zero.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Stopped, "stop")?;
        self.generated = 0;
        self.failed = 0;
        self.retries = 0;
        self.topic_index = 0;
        self.question_index = 0;
        self.current_topic_label = None;
        self.failures.clear();
        self.question_ids.clear();
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Completed, "complete")
    }

    fn transition(&mut self, to: SessionState, action: &'static str) -> Result<(), SessionError> {
        let allowed = matches!(
            (self.state, to),
            (SessionState::Idle, SessionState::Running)
                | (SessionState::Running, SessionState::Paused)
                | (SessionState::Paused, SessionState::Running)
                | (SessionState::Running, SessionState::Stopped)
                | (SessionState::Paused, SessionState::Stopped)
                | (SessionState::Running, SessionState::Completed)
        );
        if !allowed {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Moves the cursor to a slot about to be attempted.
    pub fn begin_slot(&mut self, topic_index: usize, question_index: u32) {
        self.topic_index = topic_index;
        self.question_index = question_index;
        self.current_topic_label = self
            .allocations
            .get(topic_index)
            .map(|a| a.topic.label());
    }

    pub fn record_success(&mut self, question_id: String) {
        if self.state != SessionState::Running || self.target_reached() {
            return;
        }
        self.generated += 1;
        self.question_ids.push(question_id);
    }

    pub fn record_retry(&mut self) {
        if self.state == SessionState::Running {
            self.retries += 1;
        }
    }

    pub fn record_failure(&mut self, failure: SlotFailure) {
        if self.state != SessionState::Running {
            return;
        }
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            total_topics: self.allocations.len(),
            total_questions_planned: self.total_planned,
            target_total: self.target_total,
            generated: self.generated,
            failed: self.failed,
            percentage: percentage(self.generated, self.target_total),
            current_topic_label: self.current_topic_label.clone(),
            topic_index: self.topic_index,
            question_index: self.question_index,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            state: self.state,
            total_topics: self.allocations.len(),
            total_questions_planned: self.total_planned,
            target_total: self.target_total,
            generated: self.generated,
            failed: self.failed,
            retries: self.retries,
            percentage: percentage(self.generated, self.target_total),
            failures: self.failures.clone(),
            question_ids: self.question_ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Topic;

    fn session(counts: &[u32], target: u32) -> GenerationSession {
        let allocations = counts
            .iter()
            .enumerate()
            .map(|(i, n)| Allocation {
                topic: Topic::new(format!("t{i}"), format!("Topic {i}"), 10.0),
                exact_share: *n as f64,
                rounded_share: *n,
                estimated_questions: *n,
            })
            .collect();
        GenerationSession::new("sess-test", allocations, target)
    }

    fn failure() -> SlotFailure {
        SlotFailure {
            topic_id: "t0".to_string(),
            topic_name: "Topic 0".to_string(),
            topic_index: 0,
            question_index: 0,
            attempts: 3,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut s = session(&[2, 1], 3);
        assert_eq!(s.state(), SessionState::Idle);
        s.start().unwrap();
        s.pause().unwrap();
        s.resume().unwrap();
        s.complete().unwrap();
        assert_eq!(s.state(), SessionState::Completed);
    }

    #[test]
    fn invalid_transitions_leave_counters_alone() {
        let mut s = session(&[2], 2);
        assert!(s.pause().is_err());
        s.start().unwrap();
        s.record_success("q1".to_string());
        let err = s.resume().unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: SessionState::Running,
                action: "resume"
            }
        );
        assert_eq!(s.generated(), 1);
        s.complete().unwrap();
        assert!(s.stop().is_err());
        assert_eq!(s.generated(), 1);
    }

    #[test]
    fn stop_resets_progress() {
        let mut s = session(&[3], 3);
        s.start().unwrap();
        s.begin_slot(0, 1);
        s.record_success("q1".to_string());
        s.record_failure(failure());
        s.pause().unwrap();
        s.stop().unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.state, SessionState::Stopped);
        assert_eq!((snap.generated, snap.failed), (0, 0));
        assert_eq!(s.position(), (0, 0));
        assert!(s.summary().failures.is_empty());
    }

    #[test]
    fn counters_only_move_while_running() {
        let mut s = session(&[3], 3);
        s.record_success("q0".to_string());
        assert_eq!(s.generated(), 0);
        s.start().unwrap();
        s.pause().unwrap();
        s.record_failure(failure());
        assert_eq!(s.failed(), 0);
    }

    #[test]
    fn generated_never_exceeds_target() {
        let mut s = session(&[5], 2);
        s.start().unwrap();
        for i in 0..5 {
            s.record_success(format!("q{i}"));
        }
        assert_eq!(s.generated(), 2);
        assert!(s.target_reached());
    }

    #[test]
    fn snapshot_reports_percentage_and_label() {
        let mut s = session(&[2, 2], 4);
        s.start().unwrap();
        s.begin_slot(1, 0);
        s.record_success("q1".to_string());
        let snap = s.snapshot();
        assert_eq!(snap.percentage, 25);
        assert_eq!(snap.total_questions_planned, 4);
        assert_eq!(snap.current_topic_label.as_deref(), Some("Topic 1"));
        assert_eq!((snap.topic_index, snap.question_index), (1, 0));
    }

    #[test]
    fn percentage_rounds_and_handles_zero_target() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
    }
}
