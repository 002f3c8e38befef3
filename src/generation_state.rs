use serde::{Deserialize, Serialize};

use crate::errors::GenerationFailure;
use crate::models::StudyPlanResponse;

/// Phase of a generation attempt as seen by the session that owns it.
///
/// Transitions are explicit: `submit` moves to `Generating` whenever the
/// content is non-blank, `resolve` moves `Generating` to `Ready` or `Error`.
/// The machine does not guard against overlapping submissions; callers must
/// not submit while `is_input_enabled()` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "plan", rename_all = "snake_case")]
pub enum GenerationState {
    #[default]
    Idle,
    Generating,
    Ready(StudyPlanResponse),
    Error,
}

impl GenerationState {
    pub fn new() -> Self {
        Self::Idle
    }

    /// Start a new attempt. Blank content leaves the state untouched.
    ///
    /// Returns whether a transition to `Generating` happened.
    pub fn submit(&mut self, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        *self = GenerationState::Generating;
        true
    }

    /// Apply the outcome of the outstanding attempt.
    ///
    /// Outcomes that arrive outside `Generating` are ignored and `false` is returned.
    pub fn resolve(&mut self, result: Result<StudyPlanResponse, GenerationFailure>) -> bool {
        if !matches!(self, GenerationState::Generating) {
            return false;
        }
        *self = match result {
            Ok(plan) => GenerationState::Ready(plan),
            Err(_) => GenerationState::Error,
        };
        true
    }

    pub fn is_input_enabled(&self) -> bool {
        !matches!(self, GenerationState::Generating)
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, GenerationState::Generating)
    }

    pub fn plan(&self) -> Option<&StudyPlanResponse> {
        match self {
            GenerationState::Ready(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Generating => "generating",
            GenerationState::Ready(_) => "ready",
            GenerationState::Error => "error",
        }
    }
}
