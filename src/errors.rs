use crate::api::ApiResponse;
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Why a generation attempt produced no plan.
///
/// The variants exist for diagnostics only; user-facing behavior is the same
/// for all of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    #[error("Study material is empty")]
    EmptyInput,

    #[error("Day count {0} is outside the supported range 1-14")]
    InvalidDayCount(u32),

    #[error("Generation request failed: {0}")]
    TransportFailure(String),

    #[error("Generation service returned an empty response")]
    EmptyResponse,

    #[error("Generated plan does not match the expected schema: {0}")]
    SchemaViolation(String),
}

impl GenerationFailure {
    /// Stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationFailure::EmptyInput => "empty_input",
            GenerationFailure::InvalidDayCount(_) => "invalid_day_count",
            GenerationFailure::TransportFailure(_) => "transport_failure",
            GenerationFailure::EmptyResponse => "empty_response",
            GenerationFailure::SchemaViolation(_) => "schema_violation",
        }
    }

    /// Whether the caller could have prevented this failure by validating input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GenerationFailure::EmptyInput | GenerationFailure::InvalidDayCount(_)
        )
    }
}

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("LLM service error: {0}")]
    LLMError(String),
}

impl From<GenerationFailure> for ApiError {
    fn from(failure: GenerationFailure) -> Self {
        if failure.is_input_error() {
            ApiError::ValidationError(failure.to_string())
        } else {
            ApiError::LLMError(failure.to_string())
        }
    }
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl ApiError {
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(
                        context
                            .user_friendly_message
                            .unwrap_or_else(|| format!("{} not found", context.resource_type)),
                    )),
                )
            }
            ApiError::ValidationError(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Validation error"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(
                        context
                            .user_friendly_message
                            .unwrap_or_else(|| self.to_string()),
                    )),
                )
            }
            ApiError::Conflict(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Conflicting request"
                );
                (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::LLMError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "LLM service error"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiResponse::error(
                        context.user_friendly_message.unwrap_or_else(|| {
                            "An error occurred while generating the plan. Please try again."
                                .to_string()
                        }),
                    )),
                )
            }
        }
    }
}

/// Helper macro for structured error responses
#[macro_export]
macro_rules! api_error {
    (not_found, $operation:expr, $resource_type:expr, $id:expr) => {
        $crate::errors::ApiError::NotFound(format!("{} with id '{}' not found", $resource_type, $id))
            .to_response_with_context(
                $crate::errors::ErrorContext::new($operation, $resource_type).with_id(&$id.to_string()),
            )
    };

    (conflict, $operation:expr, $resource_type:expr, $id:expr, $message:expr) => {
        $crate::errors::ApiError::Conflict($message.to_string()).to_response_with_context(
            $crate::errors::ErrorContext::new($operation, $resource_type).with_id(&$id.to_string()),
        )
    };

    (generation, $operation:expr, $resource_type:expr, $failure:expr) => {
        $crate::errors::ApiError::from($failure)
            .to_response_with_context($crate::errors::ErrorContext::new($operation, $resource_type))
    };
}
