//! CLI presentation: text and JSON renderings of topics, plans, progress and session
//! summaries.

use crate::config::ExamConfig;
use crate::error::ApiError;
use crate::generation::{AllocationPlan, ProgressSnapshot, SessionState, SessionSummary};
use crate::types::Topic;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::GenerationFailed(format!("Failed to render JSON: {}", e)))
}

/// Section heading with bold/underline.
fn format_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(header);
    table
}

fn format_weightage(weightage: f64) -> String {
    if weightage == weightage.trunc() {
        format!("{:.0}", weightage)
    } else {
        format!("{:.2}", weightage)
    }
}

pub fn format_topics_text(course: Option<&str>, topics: &[Topic]) -> String {
    if topics.is_empty() {
        return match course {
            Some(course) => format!("No topics found for course {}.", course),
            None => "No topics found.".to_string(),
        };
    }
    let mut table = new_table(vec!["#", "Topic", "Chapter", "Subject", "Weightage"]);
    for (i, topic) in topics.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            topic.name.clone(),
            topic.chapter_name.clone().unwrap_or_default(),
            topic.subject_name.clone().unwrap_or_default(),
            format_weightage(topic.weightage),
        ]);
    }
    let total: f64 = topics.iter().map(|t| t.weightage).sum();
    let title = match course {
        Some(course) => format!("Topics for course {}", course),
        None => "Topics".to_string(),
    };
    format!(
        "{}\n{}\n{} topics, total weightage {}",
        format_heading(&title),
        table,
        topics.len(),
        format_weightage(total)
    )
}

pub fn format_topics_json(topics: &[Topic]) -> Result<String, ApiError> {
    to_json(topics)
}

pub fn format_plan_text(plan: &AllocationPlan, exam: &ExamConfig) -> String {
    if plan.is_empty() {
        return "No topics to plan.".to_string();
    }
    let mut table = new_table(vec!["#", "Topic", "Weightage", "Share", "Questions"]);
    for (i, allocation) in plan.allocations.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            allocation.topic.label(),
            format_weightage(allocation.topic.weightage),
            format!("{:.2}", allocation.exact_share),
            allocation.estimated_questions.to_string(),
        ]);
    }
    let mut out = format!(
        "{}\n{}\nStrategy: {}\nQuestions: {} allocated of {} requested across {} topics\nExam: {} marks, {} minutes",
        format_heading("Question plan"),
        table,
        plan.strategy.as_str(),
        plan.total_allocated,
        plan.total_requested,
        plan.total_topics(),
        format_weightage(exam.max_marks(plan.total_allocated)),
        exam.duration_minutes(plan.total_allocated)
    );
    if !plan.exact_sum {
        out.push_str(&format!(
            "\n{}",
            format!(
                "Warning: every weighted topic needs at least one question, so the plan holds {} instead of {}.",
                plan.total_allocated, plan.total_requested
            )
            .yellow()
        ));
    }
    out
}

pub fn format_plan_json(plan: &AllocationPlan, exam: &ExamConfig) -> Result<String, ApiError> {
    let out = serde_json::json!({
        "plan": plan,
        "exam": {
            "max_marks": exam.max_marks(plan.total_allocated),
            "duration_minutes": exam.duration_minutes(plan.total_allocated),
            "correct_marks": exam.correct_marks,
            "incorrect_marks": exam.incorrect_marks,
            "skipped_marks": exam.skipped_marks,
        }
    });
    to_json(&out)
}

/// One-line progress report, e.g. `[running] 12/30 (40%) failed 1 · Algebra`.
pub fn format_progress_line(snapshot: &ProgressSnapshot) -> String {
    let mut line = format!(
        "[{}] {}/{} ({}%)",
        snapshot.state, snapshot.generated, snapshot.target_total, snapshot.percentage
    );
    if snapshot.failed > 0 {
        line.push_str(&format!(" failed {}", snapshot.failed));
    }
    if let Some(label) = &snapshot.current_topic_label {
        line.push_str(&format!(
            " · topic {}/{} {} (question {})",
            snapshot.topic_index + 1,
            snapshot.total_topics,
            label,
            snapshot.question_index + 1
        ));
    }
    line
}

fn format_failure_samples(summary: &SessionSummary, max_samples: usize) -> String {
    let mut messages: Vec<&str> = summary
        .failures
        .iter()
        .map(|failure| failure.message.as_str())
        .collect();
    messages.sort_unstable();
    messages.dedup();

    let samples: Vec<&str> = messages.into_iter().take(max_samples).collect();
    if samples.is_empty() {
        return String::new();
    }

    let mut out = format!("Sample errors: {}", samples.join(" | "));
    let remaining = summary.failures.len().saturating_sub(samples.len());
    if remaining > 0 {
        out.push_str(&format!(" | ... and {} more", remaining));
    }
    out
}

pub fn format_summary_text(summary: &SessionSummary) -> String {
    let state = match summary.state {
        SessionState::Completed => format!("{}", "completed".green()),
        SessionState::Stopped => format!("{}", "stopped".yellow()),
        other => other.to_string(),
    };
    let mut out = format!(
        "{}\nSession: {}\nState: {}\nGenerated: {}/{} ({}%)\nFailed: {}\nRetries: {}",
        format_heading("Generation summary"),
        summary.session_id,
        state,
        summary.generated,
        summary.target_total,
        summary.percentage,
        summary.failed,
        summary.retries
    );
    if !summary.failures.is_empty() {
        let mut table = new_table(vec!["Topic", "Question", "Attempts", "Error"]);
        for failure in &summary.failures {
            table.add_row(vec![
                failure.topic_name.clone(),
                (failure.question_index + 1).to_string(),
                failure.attempts.to_string(),
                failure.message.clone(),
            ]);
        }
        out.push_str(&format!("\n{}\n{}", table, format_failure_samples(summary, 3).red()));
    }
    out
}

pub fn format_summary_json(
    plan: &AllocationPlan,
    summary: &SessionSummary,
) -> Result<String, ApiError> {
    to_json(&serde_json::json!({ "plan": plan, "summary": summary }))
}
