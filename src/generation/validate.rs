//! Answer-format checks applied to every generated question before it counts.

use crate::error::ApiError;
use crate::types::{GeneratedQuestion, QuestionType};
use std::collections::HashSet;

/// Option indices named by an MCQ/MSQ answer such as `"0, 2"`. Fragments that are
/// not plain digits are skipped.
fn answer_indices(answer: &str) -> Vec<usize> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// Whether `answer` is well formed for `question_type` given `options`.
pub fn answer_matches_type(question_type: QuestionType, options: &[String], answer: &str) -> bool {
    match question_type {
        QuestionType::Mcq => {
            let indices = answer_indices(answer);
            indices.len() == 1 && indices[0] < options.len()
        }
        QuestionType::Msq => {
            let indices = answer_indices(answer);
            let distinct: HashSet<_> = indices.iter().collect();
            !indices.is_empty()
                && distinct.len() == indices.len()
                && indices.iter().all(|&i| i < options.len())
        }
        QuestionType::Nat => answer.trim().parse::<f64>().is_ok_and(f64::is_finite),
        QuestionType::Sub => !answer.trim().is_empty(),
    }
}

/// Rejects questions that would fail downstream checks.
pub fn validate_question(
    expected_type: QuestionType,
    question: &GeneratedQuestion,
) -> Result<(), ApiError> {
    if question.question_type != expected_type {
        return Err(ApiError::InvalidQuestion(format!(
            "expected a {} question, got {}",
            expected_type, question.question_type
        )));
    }
    if question.question_statement.trim().is_empty() {
        return Err(ApiError::InvalidQuestion(
            "question statement is empty".to_string(),
        ));
    }
    let options = question.options.as_deref().unwrap_or_default();
    if !answer_matches_type(expected_type, options, &question.answer) {
        return Err(ApiError::InvalidQuestion(format!(
            "answer '{}' does not satisfy {} rules",
            question.answer, expected_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TopicId;
    use chrono::Utc;

    fn options() -> Vec<String> {
        ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect()
    }

    fn question(question_type: QuestionType, answer: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            id: "q1".to_string(),
            topic_id: TopicId::new("t1"),
            topic_name: "Optics".to_string(),
            question_statement: "Which lens converges light?".to_string(),
            question_type,
            options: question_type.has_options().then(options),
            answer: answer.to_string(),
            solution: "Convex lenses converge parallel rays.".to_string(),
            difficulty_level: "Easy".to_string(),
            part_id: None,
            slot_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn mcq_needs_exactly_one_index_in_range() {
        assert!(answer_matches_type(QuestionType::Mcq, &options(), "2"));
        assert!(!answer_matches_type(QuestionType::Mcq, &options(), "0,1"));
        assert!(!answer_matches_type(QuestionType::Mcq, &options(), "4"));
        assert!(!answer_matches_type(QuestionType::Mcq, &options(), "B"));
    }

    #[test]
    fn msq_needs_distinct_indices_in_range() {
        assert!(answer_matches_type(QuestionType::Msq, &options(), "0, 2, 3"));
        assert!(answer_matches_type(QuestionType::Msq, &options(), "1"));
        assert!(!answer_matches_type(QuestionType::Msq, &options(), "1,1"));
        assert!(!answer_matches_type(QuestionType::Msq, &options(), "0,7"));
        assert!(!answer_matches_type(QuestionType::Msq, &options(), ""));
    }

    #[test]
    fn nat_needs_a_number() {
        assert!(answer_matches_type(QuestionType::Nat, &[], "9.81"));
        assert!(answer_matches_type(QuestionType::Nat, &[], " -3 "));
        assert!(!answer_matches_type(QuestionType::Nat, &[], "about ten"));
        assert!(!answer_matches_type(QuestionType::Nat, &[], "NaN"));
    }

    #[test]
    fn sub_needs_some_text() {
        assert!(answer_matches_type(QuestionType::Sub, &[], "Because entropy grows."));
        assert!(!answer_matches_type(QuestionType::Sub, &[], "   "));
    }

    #[test]
    fn validate_rejects_type_mismatch_and_empty_statement() {
        assert!(validate_question(QuestionType::Mcq, &question(QuestionType::Mcq, "1")).is_ok());

        let err = validate_question(QuestionType::Nat, &question(QuestionType::Mcq, "1")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidQuestion(_)));

        let mut blank = question(QuestionType::Sub, "Free text");
        blank.question_statement = " ".to_string();
        assert!(validate_question(QuestionType::Sub, &blank).is_err());
    }

    #[test]
    fn mcq_without_options_is_rejected() {
        let mut q = question(QuestionType::Mcq, "0");
        q.options = None;
        assert!(validate_question(QuestionType::Mcq, &q).is_err());
    }
}
