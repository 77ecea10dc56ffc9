//! Generation driver: walks an allocation plan slot by slot, calling the external
//! generator with bounded retry, and publishes progress as it goes.
//!
//! The loop is strictly sequential. It is the only writer of the
//! [`GenerationSession`]; callers observe it through snapshots and events and steer
//! it through a [`SessionHandle`].

use crate::error::ApiError;
use crate::generation::control::{Checkpoint, ControlInbox, SessionHandle};
use crate::generation::plan::AllocationPlan;
use crate::generation::retry::{RetryDecision, RetryPolicy};
use crate::generation::session::{GenerationSession, ProgressSnapshot, SessionSummary, SlotFailure};
use crate::generation::validate::validate_question;
use crate::telemetry::{
    new_session_id, ProgressBus, SessionEndedData, SessionStartedData, SlotEventData,
};
use crate::types::{GenerationMode, GeneratedQuestion, QuestionType, SlotRequest, Topic};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The external "generate one question for this topic" operation.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_one(&self, request: &SlotRequest) -> Result<GeneratedQuestion, ApiError>;
}

#[async_trait]
impl<G: QuestionGenerator + ?Sized> QuestionGenerator for Arc<G> {
    async fn generate_one(&self, request: &SlotRequest) -> Result<GeneratedQuestion, ApiError> {
        (**self).generate_one(request).await
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub retry: RetryPolicy,
    /// Pause after every successful call.
    pub success_delay: Duration,
    /// Upper bound for one generator call; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    pub question_type: QuestionType,
    pub mode: GenerationMode,
    pub part_id: Option<String>,
    pub slot_id: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            success_delay: Duration::from_millis(1000),
            call_timeout: Some(Duration::from_secs(120)),
            question_type: QuestionType::Mcq,
            mode: GenerationMode::NewQuestions,
            part_id: None,
            slot_id: None,
        }
    }
}

pub struct GenerationDriver {
    config: DriverConfig,
    progress: ProgressBus,
}

impl GenerationDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            progress: ProgressBus::new(),
        }
    }

    /// Publish events on an existing bus instead of a private one.
    pub fn with_progress(mut self, progress: ProgressBus) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressBus {
        &self.progress
    }

    /// Runs a whole session in the current task. Nobody can pause or stop it.
    pub async fn run<G>(&self, plan: &AllocationPlan, generator: &G) -> SessionSummary
    where
        G: QuestionGenerator + ?Sized,
    {
        let session = GenerationSession::from_plan(new_session_id(), plan);
        let (snapshots, _) = watch::channel(session.snapshot());
        SessionLoop {
            config: &self.config,
            bus: &self.progress,
            generator,
            session,
            inbox: ControlInbox::detached(),
            snapshots,
        }
        .drive()
        .await
    }

    /// Spawns the session on the current tokio runtime and hands back its control
    /// surface.
    pub fn start<G>(self, plan: &AllocationPlan, generator: Arc<G>) -> Result<SessionHandle, ApiError>
    where
        G: QuestionGenerator + ?Sized + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ApiError::GenerationFailed(format!("No async runtime to drive the session: {}", e))
        })?;

        let session = GenerationSession::from_plan(new_session_id(), plan);
        let session_id = session.session_id().to_string();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let bus = self.progress.clone();

        let task = runtime.spawn(async move {
            let driver = self;
            SessionLoop {
                config: &driver.config,
                bus: &driver.progress,
                generator: &*generator,
                session,
                inbox: ControlInbox::new(control_rx),
                snapshots: snapshot_tx,
            }
            .drive()
            .await
        });

        Ok(SessionHandle::new(
            session_id,
            control_tx,
            snapshot_rx,
            bus,
            task,
        ))
    }
}

struct SessionLoop<'a, G: ?Sized> {
    config: &'a DriverConfig,
    bus: &'a ProgressBus,
    generator: &'a G,
    session: GenerationSession,
    inbox: ControlInbox,
    snapshots: watch::Sender<ProgressSnapshot>,
}

impl<G: QuestionGenerator + ?Sized> SessionLoop<'_, G> {
    async fn drive(mut self) -> SessionSummary {
        if let Err(err) = self.session.start() {
            warn!(session_id = %self.session.session_id(), error = %err, "Session could not start");
            return self.session.summary();
        }
        self.publish();

        let snapshot = self.session.snapshot();
        info!(
            session_id = %snapshot.session_id,
            total_topics = snapshot.total_topics,
            planned = snapshot.total_questions_planned,
            target = snapshot.target_total,
            question_type = %self.config.question_type,
            mode = self.config.mode.as_str(),
            "Generation session started"
        );
        self.emit(
            "session_started",
            json!(SessionStartedData {
                total_topics: snapshot.total_topics,
                total_questions_planned: snapshot.total_questions_planned,
                target_total: snapshot.target_total,
                question_type: self.config.question_type.to_string(),
                mode: self.config.mode.as_str().to_string(),
            }),
        );

        let allocations = self.session.allocations().to_vec();
        'topics: for (topic_index, allocation) in allocations.iter().enumerate() {
            for question_index in 0..allocation.estimated_questions {
                if self.session.target_reached() {
                    break 'topics;
                }
                if self.checkpoint().await == Checkpoint::Stop {
                    return self.finish_stopped();
                }

                self.session.begin_slot(topic_index, question_index);
                self.publish();
                self.emit(
                    "slot_started",
                    json!(slot_data(&allocation.topic, topic_index, question_index)),
                );

                if self
                    .fill_slot(&allocation.topic, topic_index, question_index)
                    .await
                    == Checkpoint::Stop
                {
                    return self.finish_stopped();
                }
            }
        }
        self.finish_completed()
    }

    /// Slot boundary: applies queued signals and parks the loop while paused.
    async fn checkpoint(&mut self) -> Checkpoint {
        if self.inbox.drain() == Checkpoint::Stop {
            return Checkpoint::Stop;
        }
        if !self.inbox.take_pause() {
            return Checkpoint::Continue;
        }
        if let Err(err) = self.session.pause() {
            debug!(error = %err, "Pause request ignored");
            return Checkpoint::Continue;
        }
        self.publish();
        self.emit("session_paused", self.position_data());
        info!(session_id = %self.session.session_id(), "Generation session paused");

        match self.inbox.wait_for_resume().await {
            Checkpoint::Continue => {
                if let Err(err) = self.session.resume() {
                    warn!(error = %err, "Resume failed");
                    return Checkpoint::Stop;
                }
                self.publish();
                self.emit("session_resumed", self.position_data());
                info!(session_id = %self.session.session_id(), "Generation session resumed");
                Checkpoint::Continue
            }
            Checkpoint::Stop => Checkpoint::Stop,
        }
    }

    async fn fill_slot(
        &mut self,
        topic: &Topic,
        topic_index: usize,
        question_index: u32,
    ) -> Checkpoint {
        let request = SlotRequest {
            topic_id: topic.id.clone(),
            topic_name: topic.name.clone(),
            question_type: self.config.question_type,
            mode: self.config.mode,
            part_id: self.config.part_id.clone(),
            slot_id: self.config.slot_id.clone(),
        };
        let mut retry = self.config.retry.start();

        loop {
            let attempt = retry.begin_attempt();
            let started = Instant::now();
            match self.attempt(&request).await {
                Ok(question) => {
                    let question_id = question.id.clone();
                    self.session.record_success(question.id);
                    self.publish();
                    debug!(
                        topic_id = %topic.id,
                        question = question_index + 1,
                        attempt,
                        question_id = %question_id,
                        "Question generated"
                    );
                    self.emit(
                        "slot_succeeded",
                        json!(SlotEventData {
                            attempt: Some(attempt),
                            question_id: Some(question_id),
                            duration_ms: Some(started.elapsed().as_millis()),
                            ..slot_data(topic, topic_index, question_index)
                        }),
                    );
                    return self.inbox.sleep(self.config.success_delay).await;
                }
                Err(err) => {
                    let message = err.to_string();
                    self.emit(
                        "attempt_failed",
                        json!(SlotEventData {
                            attempt: Some(attempt),
                            error: Some(message.clone()),
                            duration_ms: Some(started.elapsed().as_millis()),
                            ..slot_data(topic, topic_index, question_index)
                        }),
                    );

                    match retry.record_failure(err.is_retryable()) {
                        RetryDecision::RetryAfter(delay) => {
                            self.session.record_retry();
                            debug!(
                                topic_id = %topic.id,
                                question = question_index + 1,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %message,
                                "Retrying question generation"
                            );
                            self.emit(
                                "retry_scheduled",
                                json!(SlotEventData {
                                    attempt: Some(attempt),
                                    delay_ms: Some(delay.as_millis() as u64),
                                    ..slot_data(topic, topic_index, question_index)
                                }),
                            );
                            if self.inbox.sleep(delay).await == Checkpoint::Stop {
                                return Checkpoint::Stop;
                            }
                        }
                        RetryDecision::GiveUp { attempts } => {
                            warn!(
                                topic_id = %topic.id,
                                attempts,
                                error = %message,
                                "Failed to generate question {} for topic '{}' after {} attempts",
                                question_index + 1,
                                topic.name,
                                attempts
                            );
                            self.session.record_failure(SlotFailure {
                                topic_id: topic.id.to_string(),
                                topic_name: topic.name.clone(),
                                topic_index,
                                question_index,
                                attempts,
                                message: message.clone(),
                            });
                            self.publish();
                            self.emit(
                                "slot_failed",
                                json!(SlotEventData {
                                    attempt: Some(attempts),
                                    error: Some(message),
                                    ..slot_data(topic, topic_index, question_index)
                                }),
                            );
                            return Checkpoint::Continue;
                        }
                    }
                }
            }
        }
    }

    /// One generator call under the configured timeout, followed by validation.
    async fn attempt(&self, request: &SlotRequest) -> Result<GeneratedQuestion, ApiError> {
        let call = self.generator.generate_one(request);
        let question = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ApiError::Timeout(limit))??,
            None => call.await?,
        };
        validate_question(request.question_type, &question)?;
        Ok(question)
    }

    fn finish_completed(mut self) -> SessionSummary {
        if let Err(err) = self.session.complete() {
            warn!(error = %err, "Session could not complete");
        }
        self.publish();
        let summary = self.session.summary();
        info!(
            session_id = %summary.session_id,
            generated = summary.generated,
            failed = summary.failed,
            retries = summary.retries,
            target = summary.target_total,
            "Generation session completed"
        );
        self.emit("session_completed", ended_data(&summary));
        summary
    }

    /// Stop discards progress; the log keeps what was thrown away.
    fn finish_stopped(mut self) -> SessionSummary {
        let discarded = self.session.summary();
        if let Err(err) = self.session.stop() {
            warn!(error = %err, "Session could not stop");
        }
        self.publish();
        info!(
            session_id = %discarded.session_id,
            discarded_generated = discarded.generated,
            discarded_failed = discarded.failed,
            "Generation session stopped"
        );
        let summary = self.session.summary();
        self.emit("session_stopped", ended_data(&summary));
        summary
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }

    fn emit(&self, event_type: &str, data: Value) {
        self.bus.emit(self.session.session_id(), event_type, data);
    }

    fn position_data(&self) -> Value {
        let (topic_index, question_index) = self.session.position();
        json!({
            "topic_index": topic_index,
            "question_index": question_index,
            "generated": self.session.generated(),
            "failed": self.session.failed(),
        })
    }
}

fn slot_data(topic: &Topic, topic_index: usize, question_index: u32) -> SlotEventData {
    SlotEventData {
        topic_id: topic.id.to_string(),
        topic_name: topic.name.clone(),
        topic_index,
        question_index,
        attempt: None,
        delay_ms: None,
        question_id: None,
        error: None,
        duration_ms: None,
    }
}

fn ended_data(summary: &SessionSummary) -> Value {
    json!(SessionEndedData {
        status: summary.state.to_string(),
        generated: summary.generated,
        failed: summary.failed,
        retries: summary.retries,
    })
}
