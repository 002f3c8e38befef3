use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation_state::GenerationState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>, // 4 expected
    pub correct_answer_index: usize,
}

impl QuizQuestion {
    /// True when the correct answer points at one of the options
    pub fn has_valid_answer_index(&self) -> bool {
        self.correct_answer_index < self.options.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub day: u32, // 1-based
    pub topic: String,
    pub summary: String,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
}

/// The full multi-day plan returned by a generation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanResponse {
    pub plan_name: String,
    pub total_days: u32,
    pub schedule: Vec<DailyPlan>,
}

impl StudyPlanResponse {
    pub fn day(&self, day: u32) -> Option<&DailyPlan> {
        self.schedule.iter().find(|d| d.day == day)
    }

    pub fn flashcard_count(&self) -> usize {
        self.schedule.iter().map(|d| d.flashcards.len()).sum()
    }

    pub fn quiz_question_count(&self) -> usize {
        self.schedule.iter().map(|d| d.quiz.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlanRequest {
    pub content: String,
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: GenerationState,
    pub input_enabled: bool,
    pub attempts: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
