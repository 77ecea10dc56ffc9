//! Session control: pause / resume / stop signals and the caller-side handle.

use crate::error::{ApiError, SessionError};
use crate::generation::session::{ProgressSnapshot, SessionState, SessionSummary};
use crate::telemetry::{ProgressBus, ProgressEvent};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Pause,
    Resume,
    Stop,
}

/// Result of waiting at a slot boundary or during a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint {
    Continue,
    Stop,
}

/// Loop-side end of the control channel.
///
/// Pause requests are latched and honoured at the next slot boundary; stop
/// requests interrupt delays immediately.
pub(crate) struct ControlInbox {
    rx: Option<mpsc::UnboundedReceiver<ControlSignal>>,
    pause_requested: bool,
}

impl ControlInbox {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ControlSignal>) -> Self {
        Self {
            rx: Some(rx),
            pause_requested: false,
        }
    }

    /// An inbox nobody can signal. Used by `GenerationDriver::run`.
    pub(crate) fn detached() -> Self {
        Self {
            rx: None,
            pause_requested: false,
        }
    }

    fn apply(&mut self, signal: ControlSignal) -> Checkpoint {
        match signal {
            ControlSignal::Pause => self.pause_requested = true,
            ControlSignal::Resume => {
                if !self.pause_requested {
                    debug!("resume ignored, session is not paused");
                }
                self.pause_requested = false;
            }
            ControlSignal::Stop => return Checkpoint::Stop,
        }
        Checkpoint::Continue
    }

    /// Applies every signal already queued without waiting.
    pub(crate) fn drain(&mut self) -> Checkpoint {
        let mut received = Vec::new();
        if let Some(rx) = self.rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(signal) => received.push(signal),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.rx = None;
                        break;
                    }
                }
            }
        }
        for signal in received {
            if self.apply(signal) == Checkpoint::Stop {
                return Checkpoint::Stop;
            }
        }
        Checkpoint::Continue
    }

    /// Takes the latched pause request, if any.
    pub(crate) fn take_pause(&mut self) -> bool {
        std::mem::take(&mut self.pause_requested)
    }

    /// Sleeps for `delay` unless a stop arrives first.
    pub(crate) async fn sleep(&mut self, delay: Duration) -> Checkpoint {
        if delay.is_zero() {
            return self.drain();
        }
        let deadline = tokio::time::Instant::now() + delay;
        loop {
            let Some(rx) = self.rx.as_mut() else {
                tokio::time::sleep_until(deadline).await;
                return Checkpoint::Continue;
            };
            let received = tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return Checkpoint::Continue,
                signal = rx.recv() => signal,
            };
            match received {
                Some(signal) => {
                    if self.apply(signal) == Checkpoint::Stop {
                        return Checkpoint::Stop;
                    }
                }
                None => self.rx = None,
            }
        }
    }

    /// Blocks a paused session until it is resumed or stopped. A session whose
    /// handle is gone can never be resumed, so it stops.
    pub(crate) async fn wait_for_resume(&mut self) -> Checkpoint {
        let Some(rx) = self.rx.as_mut() else {
            return Checkpoint::Stop;
        };
        loop {
            match rx.recv().await {
                Some(ControlSignal::Resume) => return Checkpoint::Continue,
                Some(ControlSignal::Stop) | None => return Checkpoint::Stop,
                Some(ControlSignal::Pause) => debug!("pause ignored, session already paused"),
            }
        }
    }
}

/// Cloneable control surface for one session.
///
/// Methods are synchronous and may be called from any thread or task while the
/// driver loop runs.
#[derive(Clone)]
pub struct SessionController {
    session_id: String,
    control: mpsc::UnboundedSender<ControlSignal>,
    snapshots: watch::Receiver<ProgressSnapshot>,
}

impl SessionController {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshots.borrow().state
    }

    pub fn pause(&self) -> Result<(), SessionError> {
        self.send(ControlSignal::Pause, "pause", &[SessionState::Idle, SessionState::Running])
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        self.send(ControlSignal::Resume, "resume", &[SessionState::Paused])
    }

    pub fn stop(&self) -> Result<(), SessionError> {
        self.send(
            ControlSignal::Stop,
            "stop",
            &[SessionState::Idle, SessionState::Running, SessionState::Paused],
        )
    }

    fn send(
        &self,
        signal: ControlSignal,
        action: &'static str,
        allowed_from: &[SessionState],
    ) -> Result<(), SessionError> {
        let state = self.state();
        if state.is_finished() {
            return Err(SessionError::Closed(self.session_id.clone()));
        }
        if !allowed_from.contains(&state) {
            return Err(SessionError::InvalidTransition {
                from: state,
                action,
            });
        }
        self.control
            .send(signal)
            .map_err(|_| SessionError::Closed(self.session_id.clone()))
    }

    /// Waits until the session reaches `state` or finishes; returns the last
    /// snapshot seen.
    pub async fn wait_for_state(&self, state: SessionState) -> ProgressSnapshot {
        let mut rx = self.snapshots.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if current.state == state || current.state.is_finished() {
                return current;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }
}

/// Caller-side handle to a running generation session. Owns the driver task.
pub struct SessionHandle {
    controller: SessionController,
    bus: ProgressBus,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: String,
        control: mpsc::UnboundedSender<ControlSignal>,
        snapshots: watch::Receiver<ProgressSnapshot>,
        bus: ProgressBus,
        task: JoinHandle<SessionSummary>,
    ) -> Self {
        Self {
            controller: SessionController {
                session_id,
                control,
                snapshots,
            },
            bus,
            task,
        }
    }

    /// A control surface that can be moved to other tasks or threads.
    pub fn controller(&self) -> SessionController {
        self.controller.clone()
    }

    pub fn session_id(&self) -> &str {
        self.controller.session_id()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.controller.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    /// Watch receiver that yields every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.controller.snapshots.clone()
    }

    /// Detailed progress events from now on.
    pub fn events(&self) -> broadcast::Receiver<ProgressEvent> {
        self.bus.subscribe()
    }

    pub fn pause(&self) -> Result<(), SessionError> {
        self.controller.pause()
    }

    pub fn resume(&self) -> Result<(), SessionError> {
        self.controller.resume()
    }

    pub fn stop(&self) -> Result<(), SessionError> {
        self.controller.stop()
    }

    pub async fn wait_for_state(&self, state: SessionState) -> ProgressSnapshot {
        self.controller.wait_for_state(state).await
    }

    /// Waits for the driver loop to finish and returns its summary.
    pub async fn join(self) -> Result<SessionSummary, ApiError> {
        self.task
            .await
            .map_err(|e| ApiError::GenerationFailed(format!("Generation task failed: {}", e)))
    }
}
