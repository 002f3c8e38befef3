use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use crate::config::DEFAULT_MAX_CONTENT_CHARS;
use crate::errors::GenerationFailure;
use crate::llm_providers::{JsonResponseParser, StructuredRequest, TextGenerator};
use crate::models::{DailyPlan, StudyPlanResponse};
use crate::plan_schema::{STUDY_PLAN_SCHEMA_NAME, study_plan_schema};

// Import logging macros
use crate::{log_llm_operation, log_validation};

/// Day counts accepted by [`PlanRequestClient::generate`]
pub const SUPPORTED_DAYS: RangeInclusive<u32> = 1..=14;

const FLASHCARDS_PER_DAY: RangeInclusive<usize> = 3..=5;
const QUIZ_QUESTIONS_PER_DAY: RangeInclusive<usize> = 1..=2;
const OPTIONS_PER_QUESTION: usize = 4;

const SYSTEM_MESSAGE: &str = "You are an expert educator who turns study material into structured learning plans. Always respond with JSON matching the requested schema.";

/// Turns study material and a day count into a validated study plan.
///
/// Every call to [`generate`](Self::generate) that passes the input checks
/// issues exactly one request to the injected [`TextGenerator`]. Nothing is
/// cached or retried.
#[derive(Clone)]
pub struct PlanRequestClient {
    generator: Arc<dyn TextGenerator>,
    json_parser: JsonResponseParser,
    max_content_chars: usize,
}

impl PlanRequestClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_content_limit(generator, DEFAULT_MAX_CONTENT_CHARS)
    }

    pub fn with_content_limit(generator: Arc<dyn TextGenerator>, max_content_chars: usize) -> Self {
        Self {
            generator,
            json_parser: JsonResponseParser,
            max_content_chars,
        }
    }

    /// Get the provider name for logging and testing
    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    /// Get the model name being used
    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    pub fn max_content_chars(&self) -> usize {
        self.max_content_chars
    }

    pub async fn generate(&self, content: &str, days: u32) -> Result<StudyPlanResponse, GenerationFailure> {
        let result = self.generate_inner(content, days).await;
        if let Err(failure) = &result {
            log_llm_operation!(
                error,
                "generate_plan",
                provider = self.provider_name(),
                kind = failure.kind(),
                error = failure
            );
        }
        result
    }

    async fn generate_inner(&self, content: &str, days: u32) -> Result<StudyPlanResponse, GenerationFailure> {
        if content.trim().is_empty() {
            return Err(GenerationFailure::EmptyInput);
        }
        if !SUPPORTED_DAYS.contains(&days) {
            return Err(GenerationFailure::InvalidDayCount(days));
        }

        let material = truncate_chars(content, self.max_content_chars);
        log_llm_operation!(
            start,
            "generate_plan",
            provider = self.provider_name(),
            days = days,
            content_chars = material.chars().count()
        );

        let request = StructuredRequest {
            system_message: Some(SYSTEM_MESSAGE.to_string()),
            prompt: build_prompt(material, days),
            schema_name: STUDY_PLAN_SCHEMA_NAME.to_string(),
            schema: study_plan_schema(),
            disable_thinking: true,
        };

        let started = Instant::now();
        let response_text = self
            .generator
            .generate_text(&request)
            .await
            .map_err(|e| GenerationFailure::TransportFailure(format!("{:#}", e)))?
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationFailure::EmptyResponse)?;

        tracing::debug!(
            response_length = response_text.len(),
            "Raw LLM response for plan generation"
        );

        let plan: StudyPlanResponse = self
            .json_parser
            .parse_json_response(&response_text)
            .map_err(|e| GenerationFailure::SchemaViolation(e.to_string()))?;

        validate_plan(&plan, days)?;

        log_llm_operation!(
            success,
            "generate_plan",
            provider = self.provider_name(),
            duration_ms = started.elapsed().as_millis() as u64,
            days = plan.total_days
        );

        Ok(plan)
    }
}

/// First `max_chars` characters of `content`, never splitting a character
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &content[..byte_index],
        None => content,
    }
}

/// Instruction sent to the model. The wording is free; the schema is the contract.
pub fn build_prompt(material: &str, days: u32) -> String {
    format!(
        r#"Create a study plan based on the material below.
Split the material logically into exactly {days} days, keeping the order of the source content.
Number the days from 1 to {days} and set totalDays to {days}.

For each day produce:
1. A guiding topic.
2. A concise summary of the most important information.
3. 3-5 flashcards (question on the front, answer on the back).
4. 1-2 quiz questions, each with exactly 4 options and the zero-based index of the single correct option.

Also give the whole plan a short descriptive name.

Material:
"""
{material}
""""#
    )
}

/// Reject plans that break the schedule or answer-index invariants.
///
/// Mismatches are reported, never repaired, so upstream defects stay visible.
pub fn validate_plan(plan: &StudyPlanResponse, requested_days: u32) -> Result<(), GenerationFailure> {
    let violation = |message: String| {
        let failure = GenerationFailure::SchemaViolation(message);
        log_validation!(failure, "study_plan", error = failure);
        Err(failure)
    };

    if plan.total_days != requested_days {
        return violation(format!(
            "totalDays is {} but {} days were requested",
            plan.total_days, requested_days
        ));
    }

    if plan.schedule.len() != requested_days as usize {
        return violation(format!(
            "schedule has {} entries but {} days were requested",
            plan.schedule.len(),
            requested_days
        ));
    }

    for (index, daily) in plan.schedule.iter().enumerate() {
        let expected_day = index as u32 + 1;
        if daily.day != expected_day {
            return violation(format!(
                "schedule entry {} has day {} but day {} was expected",
                index, daily.day, expected_day
            ));
        }

        for (question_index, question) in daily.quiz.iter().enumerate() {
            if !question.has_valid_answer_index() {
                return violation(format!(
                    "day {} question {} has correctAnswerIndex {} with {} options",
                    daily.day,
                    question_index + 1,
                    question.correct_answer_index,
                    question.options.len()
                ));
            }
        }

        warn_on_soft_expectations(daily);
    }

    log_validation!(success, "study_plan", "plan matches requested schedule");
    Ok(())
}

fn warn_on_soft_expectations(daily: &DailyPlan) {
    if !FLASHCARDS_PER_DAY.contains(&daily.flashcards.len()) {
        log_llm_operation!(
            warn,
            "generate_plan",
            format!("day {} has {} flashcards", daily.day, daily.flashcards.len())
        );
    }
    if !QUIZ_QUESTIONS_PER_DAY.contains(&daily.quiz.len()) {
        log_llm_operation!(
            warn,
            "generate_plan",
            format!("day {} has {} quiz questions", daily.day, daily.quiz.len())
        );
    }
    for question in daily.quiz.iter().filter(|q| q.options.len() != OPTIONS_PER_QUESTION) {
        log_llm_operation!(
            warn,
            "generate_plan",
            format!(
                "day {} question '{}' has {} options",
                daily.day,
                question.question,
                question.options.len()
            )
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flashcard, QuizQuestion};

    fn plan_with_days(days: u32) -> StudyPlanResponse {
        StudyPlanResponse {
            plan_name: "Plan".to_string(),
            total_days: days,
            schedule: (1..=days)
                .map(|day| DailyPlan {
                    day,
                    topic: format!("Topic {}", day),
                    summary: "Summary".to_string(),
                    flashcards: vec![
                        Flashcard {
                            front: "Q".to_string(),
                            back: "A".to_string(),
                        };
                        3
                    ],
                    quiz: vec![QuizQuestion {
                        question: "Which?".to_string(),
                        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                        correct_answer_index: 2,
                    }],
                })
                .collect(),
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("", 3), "");
        // Multi-byte characters are never split
        assert_eq!(truncate_chars("zażółć", 4), "zażó");
    }

    #[test]
    fn test_prompt_mentions_days_and_material() {
        let prompt = build_prompt("Chapter 1: Cells", 2);
        assert!(prompt.contains("exactly 2 days"));
        assert!(prompt.contains("Chapter 1: Cells"));
        assert!(prompt.contains("3-5 flashcards"));
    }

    #[test]
    fn test_valid_plan_passes() {
        assert!(validate_plan(&plan_with_days(3), 3).is_ok());
        assert!(validate_plan(&plan_with_days(14), 14).is_ok());
    }

    #[test]
    fn test_total_days_mismatch_fails() {
        let plan = plan_with_days(3);
        assert!(matches!(
            validate_plan(&plan, 4),
            Err(GenerationFailure::SchemaViolation(_))
        ));

        let mut plan = plan_with_days(3);
        plan.schedule.pop();
        assert!(matches!(
            validate_plan(&plan, 3),
            Err(GenerationFailure::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_non_sequential_days_fail() {
        let mut plan = plan_with_days(3);
        plan.schedule[1].day = 3;
        plan.schedule[2].day = 2;
        assert!(matches!(
            validate_plan(&plan, 3),
            Err(GenerationFailure::SchemaViolation(_))
        ));

        let mut plan = plan_with_days(2);
        plan.schedule[0].day = 0;
        plan.schedule[1].day = 1;
        assert!(validate_plan(&plan, 2).is_err());
    }

    #[test]
    fn test_answer_index_out_of_range_fails() {
        let mut plan = plan_with_days(2);
        plan.schedule[1].quiz[0].correct_answer_index = 4;
        assert!(matches!(
            validate_plan(&plan, 2),
            Err(GenerationFailure::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_soft_expectations_do_not_fail() {
        let mut plan = plan_with_days(1);
        plan.schedule[0].flashcards.clear();
        plan.schedule[0].quiz.clear();
        assert!(validate_plan(&plan, 1).is_ok());
    }
}
