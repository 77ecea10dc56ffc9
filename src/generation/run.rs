//! Single generate entry point: load topics, plan, drive.
//! CLI and other callers use this only; no planner/driver wiring in adapters.

use crate::error::ApiError;
use crate::generation::control::SessionController;
use crate::generation::driver::{DriverConfig, GenerationDriver, QuestionGenerator};
use crate::generation::plan::{plan, AllocationPlan};
use crate::generation::session::{ProgressSnapshot, SessionSummary};
use crate::types::Topic;
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The external "list topics with weightage" operation. Order is preserved.
#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn list_topics_with_weightage(&self, course_id: &str) -> Result<Vec<Topic>, ApiError>;
}

/// Where the topic list comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicInput {
    Course(String),
    File(PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicsDocument {
    List(Vec<Topic>),
    Wrapped { topics: Vec<Topic> },
}

impl TopicsDocument {
    fn into_topics(self) -> Vec<Topic> {
        match self {
            TopicsDocument::List(topics) | TopicsDocument::Wrapped { topics } => topics,
        }
    }
}

/// Reads a topic list from a JSON file (array or `{"topics": [...]}`) or a TOML
/// file with `[[topics]]` tables.
pub fn load_topics_file(path: &Path) -> Result<Vec<Topic>, ApiError> {
    let raw = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let document: TopicsDocument = if is_toml {
        toml::from_str(&raw).map_err(|e| {
            ApiError::ConfigError(format!("Invalid topics file {}: {}", path.display(), e))
        })?
    } else {
        serde_json::from_str(&raw).map_err(|e| {
            ApiError::ConfigError(format!("Invalid topics file {}: {}", path.display(), e))
        })?
    };
    Ok(document.into_topics())
}

async fn resolve_topics<S>(source: &S, input: &TopicInput) -> Result<Vec<Topic>, ApiError>
where
    S: TopicSource + ?Sized,
{
    let topics = match input {
        TopicInput::Course(course_id) => source.list_topics_with_weightage(course_id).await?,
        TopicInput::File(path) => load_topics_file(path)?,
    };
    debug!(count = topics.len(), "Topics loaded");
    Ok(topics)
}

fn block_on<F: Future>(future: F) -> Result<F::Output, ApiError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ApiError::GenerationFailed(
            "Cannot start a blocking run from within an async runtime; use GenerationDriver::start instead.".to_string(),
        ));
    }
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| ApiError::GenerationFailed(format!("Failed to create runtime: {}", e)))?;
    Ok(rt.block_on(future))
}

/// Lists the topics of `input` without planning.
pub fn run_topics<S>(source: &S, input: &TopicInput) -> Result<Vec<Topic>, ApiError>
where
    S: TopicSource + ?Sized,
{
    block_on(resolve_topics(source, input))?
}

/// Loads topics and computes the allocation plan without generating anything.
pub fn run_plan<S>(source: &S, input: &TopicInput, total_questions: u32) -> Result<AllocationPlan, ApiError>
where
    S: TopicSource + ?Sized,
{
    let topics = run_topics(source, input)?;
    Ok(plan(&topics, total_questions)?)
}

/// Request for a single generate run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub topics: TopicInput,
    pub total_questions: u32,
    pub driver: DriverConfig,
    /// Read `p` / `r` / `s` lines from stdin as pause / resume / stop.
    pub interactive: bool,
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub plan: AllocationPlan,
    pub summary: SessionSummary,
}

/// Single generate entry point: load topics, plan, start the driver and follow it
/// to the end. `observer` sees every published snapshot. Ctrl-C stops the session.
pub fn run_generate<C, F>(
    client: Arc<C>,
    request: &GenerateRequest,
    mut observer: F,
) -> Result<GenerateOutcome, ApiError>
where
    C: TopicSource + QuestionGenerator + 'static,
    F: FnMut(&ProgressSnapshot),
{
    block_on(async move {
        let topics = resolve_topics(client.as_ref(), &request.topics).await?;
        let plan = plan(&topics, request.total_questions)?;
        info!(
            topics = plan.total_topics(),
            allocated = plan.total_allocated,
            requested = plan.total_requested,
            strategy = plan.strategy.as_str(),
            "Allocation plan ready"
        );

        let handle = GenerationDriver::new(request.driver.clone()).start(&plan, client)?;

        let on_interrupt = handle.controller();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping generation");
                if let Err(err) = on_interrupt.stop() {
                    debug!(error = %err, "Stop after interrupt ignored");
                }
            }
        });
        if request.interactive {
            spawn_stdin_controls(handle.controller());
        }

        let mut updates = handle.subscribe();
        loop {
            let snapshot = updates.borrow_and_update().clone();
            observer(&snapshot);
            if snapshot.state.is_finished() || updates.changed().await.is_err() {
                break;
            }
        }

        let summary = handle.join().await?;
        Ok(GenerateOutcome { plan, summary })
    })?
}

/// Maps stdin lines to control signals on a detached thread.
fn spawn_stdin_controls(controller: SessionController) {
    let spawned = std::thread::Builder::new()
        .name("qmaker-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let result = match line.trim().to_ascii_lowercase().as_str() {
                    "p" | "pause" => controller.pause(),
                    "r" | "resume" => controller.resume(),
                    "s" | "stop" => controller.stop(),
                    "" => continue,
                    other => {
                        eprintln!("Unknown command '{}': use p (pause), r (resume) or s (stop)", other);
                        continue;
                    }
                };
                if let Err(err) = result {
                    eprintln!("{}", err);
                }
                if controller.state().is_finished() {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "Interactive controls unavailable");
    }
}
