//! Domain records shared by the planner, the driver and the backend client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque topic identifier as issued by the question backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TopicId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Leaf of the exam → course → subject → unit → chapter → topic hierarchy.
///
/// Ancestor names are carried for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    /// Percentage-like share of the syllabus; `null` on the wire reads as zero.
    #[serde(default, deserialize_with = "weightage_or_zero")]
    pub weightage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_name: Option<String>,
}

impl Topic {
    pub fn new(id: impl Into<TopicId>, name: impl Into<String>, weightage: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weightage,
            subject_name: None,
            unit_name: None,
            chapter_name: None,
        }
    }

    /// Human-readable label used in progress snapshots and notices.
    pub fn label(&self) -> String {
        match (&self.subject_name, &self.chapter_name) {
            (Some(subject), Some(chapter)) => format!("{} › {} › {}", subject, chapter, self.name),
            (None, Some(chapter)) => format!("{} › {}", chapter, self.name),
            (Some(subject), None) => format!("{} › {}", subject, self.name),
            (None, None) => self.name.clone(),
        }
    }
}

fn weightage_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Answer format of a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// Multiple choice, exactly one correct option.
    #[serde(rename = "MCQ")]
    Mcq,
    /// Multiple select, one or more correct options.
    #[serde(rename = "MSQ")]
    Msq,
    /// Numerical answer type.
    #[serde(rename = "NAT")]
    Nat,
    /// Subjective, free-text answer.
    #[serde(rename = "SUB")]
    Sub,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Msq => "MSQ",
            QuestionType::Nat => "NAT",
            QuestionType::Sub => "SUB",
        }
    }

    pub fn has_options(self) -> bool {
        matches!(self, QuestionType::Mcq | QuestionType::Msq)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MCQ" => Ok(QuestionType::Mcq),
            "MSQ" => Ok(QuestionType::Msq),
            "NAT" => Ok(QuestionType::Nat),
            "SUB" => Ok(QuestionType::Sub),
            other => Err(format!(
                "Unknown question type '{}' (expected MCQ, MSQ, NAT or SUB)",
                other
            )),
        }
    }
}

/// What one generation slot produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Fresh practice questions with answer and solution.
    NewQuestions,
    /// Solutions for previous-year questions of the topic.
    PyqSolutions,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::NewQuestions => "new_questions",
            GenerationMode::PyqSolutions => "pyq_solutions",
        }
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "new_questions" => Ok(GenerationMode::NewQuestions),
            "pyq_solutions" | "solutions" => Ok(GenerationMode::PyqSolutions),
            other => Err(format!(
                "Unknown generation mode '{}' (expected new_questions or pyq_solutions)",
                other
            )),
        }
    }
}

/// Everything the external generator needs to fill one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRequest {
    pub topic_id: TopicId,
    #[serde(skip)]
    pub topic_name: String,
    pub question_type: QuestionType,
    #[serde(rename = "generation_mode")]
    pub mode: GenerationMode,
    pub part_id: Option<String>,
    pub slot_id: Option<String>,
}

/// A question (or solution) record returned by the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub id: String,
    pub topic_id: TopicId,
    #[serde(default)]
    pub topic_name: String,
    pub question_statement: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub answer: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default = "default_difficulty")]
    pub difficulty_level: String,
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub slot_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_difficulty() -> String {
    "Medium".to_string()
}
